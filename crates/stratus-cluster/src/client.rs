//! Control-plane client seams
//!
//! The stack engine and the network inventory are reached through two traits
//! so that tests can substitute mocks while production code plugs in an
//! authenticated, region-bound SDK client. Implementations are expected to be
//! thin: one trait method per API call, no retries, no caching.

use std::fmt;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Failure returned by a control-plane API call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    /// Provider error code (e.g., "ValidationError", "Throttling")
    pub code: String,
    /// Provider error message
    pub message: String,
}

impl ApiError {
    /// Create an API error from a provider code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Parameter declared by a validated template
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateParameter {
    /// Parameter name
    pub key: String,
    /// Default value, if any
    pub default_value: Option<String>,
    /// Parameter description
    pub description: Option<String>,
}

/// Report returned by template validation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateValidation {
    /// Template description
    pub description: Option<String>,
    /// Capabilities the template requires (e.g., "CAPABILITY_IAM")
    pub capabilities: Vec<String>,
    /// Why the capabilities are required
    pub capabilities_reason: Option<String>,
    /// Declared parameters
    pub parameters: Vec<TemplateParameter>,
}

impl fmt::Display for TemplateValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        if !self.capabilities.is_empty() {
            writeln!(f, "  Capabilities: [{}],", self.capabilities.join(", "))?;
        }
        if let Some(ref reason) = self.capabilities_reason {
            writeln!(f, "  CapabilitiesReason: \"{}\",", reason)?;
        }
        if let Some(ref description) = self.description {
            writeln!(f, "  Description: \"{}\",", description)?;
        }
        for p in &self.parameters {
            write!(f, "  Parameter: {{ ParameterKey: \"{}\"", p.key)?;
            if let Some(ref d) = p.default_value {
                write!(f, ", DefaultValue: \"{}\"", d)?;
            }
            if let Some(ref d) = p.description {
                write!(f, ", Description: \"{}\"", d)?;
            }
            writeln!(f, " }},")?;
        }
        write!(f, "}}")
    }
}

/// One stack as returned by a describe call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackDescription {
    /// Stack id assigned by the control plane
    pub stack_id: String,
    /// Stack name
    pub stack_name: String,
    /// Raw provider status (e.g., "CREATE_IN_PROGRESS")
    pub stack_status: String,
    /// Provider explanation of the current status
    pub stack_status_reason: Option<String>,
}

/// Rollback behaviour when stack creation fails
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnFailure {
    /// Leave failed resources in place for inspection
    DoNothing,
    /// Roll back created resources
    Rollback,
    /// Delete the stack
    Delete,
}

impl OnFailure {
    /// Provider wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoNothing => "DO_NOTHING",
            Self::Rollback => "ROLLBACK",
            Self::Delete => "DELETE",
        }
    }
}

/// Capability allowing a stack to create identity and access resources
pub const CAPABILITY_IAM: &str = "CAPABILITY_IAM";

/// Stack creation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateStackRequest {
    /// Stack name
    pub stack_name: String,
    /// Rendered stack document
    pub template_body: String,
    /// Rollback behaviour on failure
    pub on_failure: OnFailure,
    /// Acknowledged capabilities
    pub capabilities: Vec<String>,
}

/// Stack update request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateStackRequest {
    /// Stack name
    pub stack_name: String,
    /// Rendered stack document
    pub template_body: String,
    /// Acknowledged capabilities
    pub capabilities: Vec<String>,
}

/// Output of an accepted update request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateStackOutput {
    /// Id of the stack being updated
    pub stack_id: String,
}

impl fmt::Display for UpdateStackOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\n  StackId: \"{}\"\n}}", self.stack_id)
    }
}

/// Summary of one stack resource
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackResourceSummary {
    /// Template-defined name of the resource
    pub logical_resource_id: String,
    /// Provider-assigned id; absent until the resource is materialized
    pub physical_resource_id: Option<String>,
    /// Resource type (e.g., "AWS::EC2::EIP")
    pub resource_type: String,
    /// Raw provider resource status
    pub resource_status: String,
}

/// One page of stack resources
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackResourcePage {
    /// Resources on this page
    pub resources: Vec<StackResourceSummary>,
    /// Continuation token; `None` or empty on the last page
    pub next_token: Option<String>,
}

/// A VPC as returned by the network inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vpc {
    /// VPC id
    pub vpc_id: String,
    /// Primary CIDR block
    pub cidr_block: String,
}

/// A subnet as returned by the network inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subnet {
    /// Subnet id
    pub subnet_id: String,
    /// Owning VPC id
    pub vpc_id: String,
    /// CIDR block
    pub cidr_block: String,
}

/// One page of subnets
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubnetPage {
    /// Subnets on this page
    pub subnets: Vec<Subnet>,
    /// Continuation token; `None` or empty on the last page
    pub next_token: Option<String>,
}

/// Stack engine operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StackClient: Send + Sync {
    /// Validate a stack document without provisioning anything
    async fn validate_template(&self, template_body: &str)
        -> Result<TemplateValidation, ApiError>;

    /// Describe stacks matching a name or id
    async fn describe_stacks(&self, stack_name: &str) -> Result<Vec<StackDescription>, ApiError>;

    /// Submit a create; returns the new stack id
    async fn create_stack(&self, request: &CreateStackRequest) -> Result<String, ApiError>;

    /// Submit an update
    async fn update_stack(&self, request: &UpdateStackRequest)
        -> Result<UpdateStackOutput, ApiError>;

    /// Submit a delete; returns once the request is accepted
    async fn delete_stack(&self, stack_name: &str) -> Result<(), ApiError>;

    /// List one page of a stack's resources
    async fn list_stack_resources(
        &self,
        stack_name: &str,
        next_token: Option<String>,
    ) -> Result<StackResourcePage, ApiError>;
}

/// Network inventory operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Describe VPCs by id
    async fn describe_vpcs(&self, vpc_ids: &[String]) -> Result<Vec<Vpc>, ApiError>;

    /// List one page of the subnets belonging to a VPC
    async fn describe_subnets(
        &self,
        vpc_id: &str,
        next_token: Option<String>,
    ) -> Result<SubnetPage, ApiError>;
}

/// Normalize a continuation token; providers signal the last page with
/// either no token or an empty one.
pub(crate) fn continuation(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_is_code_then_message() {
        let err = ApiError::new("ValidationError", "Stack with id x does not exist");
        assert_eq!(
            err.to_string(),
            "ValidationError: Stack with id x does not exist"
        );
    }

    #[test]
    fn empty_continuation_token_ends_pagination() {
        assert_eq!(continuation(None), None);
        assert_eq!(continuation(Some(String::new())), None);
        assert_eq!(continuation(Some("abc".into())), Some("abc".to_string()));
    }

    #[test]
    fn validation_report_renders_fields() {
        let report = TemplateValidation {
            description: Some("kubernetes cluster mycluster".to_string()),
            capabilities: vec![CAPABILITY_IAM.to_string()],
            capabilities_reason: Some("creates IAM roles".to_string()),
            parameters: vec![TemplateParameter {
                key: "KeyName".to_string(),
                ..Default::default()
            }],
        };
        let text = report.to_string();
        assert!(text.contains("Capabilities: [CAPABILITY_IAM]"));
        assert!(text.contains("Description: \"kubernetes cluster mycluster\""));
        assert!(text.contains("ParameterKey: \"KeyName\""));
    }

    #[test]
    fn on_failure_wire_values() {
        assert_eq!(OnFailure::DoNothing.as_str(), "DO_NOTHING");
        assert_eq!(OnFailure::Rollback.as_str(), "ROLLBACK");
    }
}
