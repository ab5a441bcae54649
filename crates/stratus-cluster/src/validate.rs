//! Pre-flight stack validation
//!
//! Validates the rendered stack document, determines whether the stack
//! already exists and, only before the first create into an existing VPC,
//! runs the subnet conflict check.

use regex::Regex;
use tracing::{debug, info};

use stratus_common::{ClusterConfig, Error, Result};

use crate::client::{ApiError, NetworkClient, StackClient};
use crate::network::check_no_conflict;

/// Whether a named stack exists in the control plane
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackPresence {
    /// A stack with the name exists
    Exists,
    /// No stack with the name exists
    Absent,
}

/// Classify a describe-by-name failure.
///
/// The provider reports a missing stack as a `ValidationError` whose free
/// text names the stack. Matching on that text is brittle, so it is confined
/// here: `Some(Absent)` for the not-found message, `None` for anything else.
pub fn classify_describe_error(stack_name: &str, err: &ApiError) -> Option<StackPresence> {
    let pattern = format!(
        "^ValidationError: Stack with id {} does not exist",
        regex::escape(stack_name)
    );
    match Regex::new(&pattern) {
        Ok(re) if re.is_match(&err.to_string()) => Some(StackPresence::Absent),
        _ => None,
    }
}

/// Look up whether `stack_name` exists.
pub async fn stack_presence(client: &dyn StackClient, stack_name: &str) -> Result<StackPresence> {
    match client.describe_stacks(stack_name).await {
        // An empty successful answer means no stack, so the conflict check
        // still runs before the first create.
        Ok(stacks) => match stacks.len() {
            0 => Ok(StackPresence::Absent),
            1 => Ok(StackPresence::Exists),
            n => Err(Error::invariant(format!(
                "found {} stacks with unique name {}",
                n, stack_name
            ))),
        },
        Err(e) => classify_describe_error(stack_name, &e)
            .ok_or_else(|| Error::transport("DescribeStacks", e)),
    }
}

/// Validate `template_body` for the cluster described by `config`.
///
/// Returns the provider's validation report. Template errors short-circuit
/// before any existence or conflict check.
pub async fn validate_stack(
    stacks: &dyn StackClient,
    network: &dyn NetworkClient,
    config: &ClusterConfig,
    template_body: &str,
) -> Result<String> {
    let report = stacks
        .validate_template(template_body)
        .await
        .map_err(Error::invalid_template)?;

    let presence = stack_presence(stacks, &config.cluster_name).await?;
    debug!(cluster = %config.cluster_name, ?presence, "stack lookup complete");

    // Once the stack exists its own subnet is already in the VPC; checking
    // again would flag the cluster's own infrastructure.
    if let (Some(vpc_id), StackPresence::Absent) = (config.vpc_id.as_deref(), presence) {
        info!(
            cluster = %config.cluster_name,
            vpc_id = %vpc_id,
            "existing VPC detected, validating for subnet CIDR conflicts"
        );
        check_no_conflict(
            network,
            &config.region,
            vpc_id,
            &config.vpc_cidr,
            &config.instance_cidr,
        )
        .await?;
    }

    Ok(report.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        MockNetworkClient, MockStackClient, StackDescription, Subnet, SubnetPage,
        TemplateValidation, Vpc,
    };

    fn not_found(name: &str) -> ApiError {
        ApiError::new(
            "ValidationError",
            format!("Stack with id {} does not exist", name),
        )
    }

    fn report() -> TemplateValidation {
        TemplateValidation {
            description: Some("kubernetes cluster".to_string()),
            capabilities: vec!["CAPABILITY_IAM".to_string()],
            ..Default::default()
        }
    }

    fn existing_stack() -> Vec<StackDescription> {
        vec![StackDescription {
            stack_id: "arn:stack/mycluster/1".to_string(),
            stack_name: "mycluster".to_string(),
            stack_status: "CREATE_COMPLETE".to_string(),
            stack_status_reason: None,
        }]
    }

    fn vpc_config() -> ClusterConfig {
        ClusterConfig::new("mycluster", "us-west-2")
            .with_existing_vpc("vpc-1", "10.0.0.0/16")
            .with_instance_cidr("10.0.1.0/24")
    }

    fn conflicting_network() -> MockNetworkClient {
        let mut network = MockNetworkClient::new();
        network.expect_describe_vpcs().returning(|_| {
            Ok(vec![Vpc {
                vpc_id: "vpc-1".to_string(),
                cidr_block: "10.0.0.0/16".to_string(),
            }])
        });
        network.expect_describe_subnets().returning(|_, _| {
            Ok(SubnetPage {
                subnets: vec![Subnet {
                    subnet_id: "subnet-a".to_string(),
                    vpc_id: "vpc-1".to_string(),
                    cidr_block: "10.0.1.0/24".to_string(),
                }],
                next_token: None,
            })
        });
        network
    }

    #[test]
    fn not_found_message_is_recognised() {
        assert_eq!(
            classify_describe_error("mycluster", &not_found("mycluster")),
            Some(StackPresence::Absent)
        );
    }

    #[test]
    fn other_errors_are_not_absence() {
        assert_eq!(
            classify_describe_error("mycluster", &ApiError::new("Throttling", "Rate exceeded")),
            None
        );
        // A not-found for a different stack is not ours
        assert_eq!(
            classify_describe_error("mycluster", &not_found("othercluster")),
            None
        );
    }

    #[test]
    fn stack_name_is_matched_literally() {
        // '.' must not act as a wildcard
        assert_eq!(
            classify_describe_error("my.cluster", &not_found("myXcluster")),
            None
        );
    }

    #[tokio::test]
    async fn empty_describe_is_absent() {
        let mut stacks = MockStackClient::new();
        stacks.expect_describe_stacks().returning(|_| Ok(vec![]));

        let presence = stack_presence(&stacks, "mycluster").await.unwrap();
        assert_eq!(presence, StackPresence::Absent);
    }

    #[tokio::test]
    async fn empty_describe_still_checks_conflicts_in_existing_vpc() {
        let mut stacks = MockStackClient::new();
        stacks.expect_validate_template().returning(|_| Ok(report()));
        stacks.expect_describe_stacks().returning(|_| Ok(vec![]));

        let err = validate_stack(&stacks, &conflicting_network(), &vpc_config(), "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SubnetConflict { .. }));
    }

    #[tokio::test]
    async fn absent_stack_without_vpc_skips_conflict_check() {
        let mut stacks = MockStackClient::new();
        stacks
            .expect_validate_template()
            .returning(|_| Ok(report()));
        stacks
            .expect_describe_stacks()
            .withf(|name| name == "mycluster")
            .returning(|_| Err(not_found("mycluster")));
        let mut network = MockNetworkClient::new();
        network.expect_describe_vpcs().never();
        network.expect_describe_subnets().never();

        let config = ClusterConfig::new("mycluster", "us-west-2");
        let text = validate_stack(&stacks, &network, &config, "{}")
            .await
            .expect("validation should pass");
        assert_eq!(text, report().to_string());
    }

    #[tokio::test]
    async fn invalid_template_short_circuits() {
        let mut stacks = MockStackClient::new();
        stacks
            .expect_validate_template()
            .returning(|_| {
                Err(ApiError::new(
                    "ValidationError",
                    "Template format error: JSON not well-formed",
                ))
            });
        stacks.expect_describe_stacks().never();
        let network = MockNetworkClient::new();

        let err = validate_stack(&stacks, &network, &vpc_config(), "{")
            .await
            .unwrap_err();
        match err {
            Error::InvalidTemplate { message } => assert!(message.contains("not well-formed")),
            other => panic!("Expected InvalidTemplate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_create_into_existing_vpc_checks_conflicts() {
        let mut stacks = MockStackClient::new();
        stacks.expect_validate_template().returning(|_| Ok(report()));
        stacks
            .expect_describe_stacks()
            .returning(|_| Err(not_found("mycluster")));

        let err = validate_stack(&stacks, &conflicting_network(), &vpc_config(), "{}")
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::SubnetConflict { ref subnet_id, .. } if subnet_id == "subnet-a")
        );
    }

    #[tokio::test]
    async fn existing_stack_skips_conflict_check() {
        let mut stacks = MockStackClient::new();
        stacks.expect_validate_template().returning(|_| Ok(report()));
        stacks
            .expect_describe_stacks()
            .returning(|_| Ok(existing_stack()));
        let mut network = MockNetworkClient::new();
        network.expect_describe_vpcs().never();

        validate_stack(&stacks, &network, &vpc_config(), "{}")
            .await
            .expect("own subnet must not be reported as a conflict");
    }

    #[tokio::test]
    async fn describe_failure_is_transport_error() {
        let mut stacks = MockStackClient::new();
        stacks.expect_validate_template().returning(|_| Ok(report()));
        stacks
            .expect_describe_stacks()
            .returning(|_| Err(ApiError::new("Throttling", "Rate exceeded")));
        let network = MockNetworkClient::new();

        let err = validate_stack(&stacks, &network, &vpc_config(), "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[tokio::test]
    async fn duplicate_stacks_are_an_invariant_violation() {
        let mut stacks = MockStackClient::new();
        stacks.expect_validate_template().returning(|_| Ok(report()));
        stacks.expect_describe_stacks().returning(|_| {
            let mut both = existing_stack();
            both.extend(existing_stack());
            Ok(both)
        });
        let network = MockNetworkClient::new();

        let err = validate_stack(&stacks, &network, &vpc_config(), "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation { .. }));
    }

    #[tokio::test]
    async fn repeated_validation_is_stable() {
        let mut stacks = MockStackClient::new();
        stacks.expect_validate_template().times(2).returning(|_| Ok(report()));
        stacks
            .expect_describe_stacks()
            .times(2)
            .returning(|_| Err(not_found("mycluster")));
        let config = ClusterConfig::new("mycluster", "us-west-2");
        let network = MockNetworkClient::new();

        let first = validate_stack(&stacks, &network, &config, "{}").await.unwrap();
        let second = validate_stack(&stacks, &network, &config, "{}").await.unwrap();
        assert_eq!(first, second);
    }
}
