//! Error types for stratus
//!
//! Errors are structured with fields so a caller can act on them without
//! re-querying the control plane: every variant names the stack, VPC, subnet,
//! CIDR or status string it is about.

use std::time::Duration;

use thiserror::Error;

/// Main error type for stratus operations
#[derive(Debug, Error)]
pub enum Error {
    /// A control-plane API call failed. Never retried by this crate.
    #[error("{operation} failed: {message}")]
    Transport {
        /// The API operation that failed (e.g., "DescribeStacks")
        operation: String,
        /// Provider error text
        message: String,
    },

    /// The stack document was rejected by template validation
    #[error("invalid stack template: {message}")]
    InvalidTemplate {
        /// Provider validation message
        message: String,
    },

    /// The configured VPC CIDR does not match the live VPC
    #[error("configured vpcCIDR ({configured}) does not match actual existing vpc {vpc_id} cidr ({live})")]
    StaleTopology {
        /// Id of the existing VPC
        vpc_id: String,
        /// CIDR from the cluster configuration
        configured: String,
        /// CIDR reported by the control plane
        live: String,
    },

    /// The instance CIDR overlaps a subnet already present in the VPC
    #[error("instance cidr ({instance_cidr}) conflicts with existing subnet {subnet_id}, cidr={subnet_cidr}")]
    SubnetConflict {
        /// Id of the conflicting subnet
        subnet_id: String,
        /// CIDR of the conflicting subnet
        subnet_cidr: String,
        /// The candidate instance CIDR
        instance_cidr: String,
    },

    /// No VPC exists with the configured id
    #[error("could not find vpc {vpc_id} in region {region}")]
    VpcNotFound {
        /// The configured VPC id
        vpc_id: String,
        /// Region that was searched
        region: String,
    },

    /// More than one VPC was returned for a single id
    #[error("found {count} vpcs with id {vpc_id}; expected exactly one")]
    AmbiguousVpc {
        /// The configured VPC id
        vpc_id: String,
        /// Number of VPCs returned
        count: usize,
    },

    /// The control plane broke a contract that should be impossible to break
    #[error("control plane invariant violated: {message}")]
    InvariantViolation {
        /// What was observed
        message: String,
    },

    /// A create or update reached a terminal failure status
    #[error("stack {stack} reached {status}: {reason}")]
    ProvisioningFailed {
        /// Stack name or id
        stack: String,
        /// Terminal status string reported by the provider
        status: String,
        /// Provider status reason
        reason: String,
    },

    /// A poll returned a status this crate does not recognise
    #[error("unexpected stack status for {stack}: {status}")]
    UnexpectedState {
        /// Stack name or id
        stack: String,
        /// The unrecognised status string
        status: String,
    },

    /// A stack resource exists but has not been populated yet
    #[error("stack {stack} resource {logical_id} has no physical id yet")]
    IncompleteStack {
        /// Stack name
        stack: String,
        /// Logical id of the unpopulated resource
        logical_id: String,
    },

    /// A stack disappeared while it was being polled
    #[error("stack {stack} not found")]
    StackNotFound {
        /// Stack name or id
        stack: String,
    },

    /// A CIDR could not be parsed
    #[error("error parsing {context} cidr {cidr}: {message}")]
    InvalidCidr {
        /// What the CIDR describes (e.g., "instance", "existing subnet")
        context: String,
        /// The offending text
        cidr: String,
        /// Parser error
        message: String,
    },

    /// Cluster configuration is invalid
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
        /// The invalid field (e.g., "instanceCIDR")
        field: Option<String>,
    },

    /// Cluster configuration could not be read
    #[error("config error [{path}]: {message}")]
    Config {
        /// Path or source of the configuration
        path: String,
        /// Description of what failed
        message: String,
    },

    /// Polling was cancelled by the caller
    #[error("polling stack {stack} was cancelled")]
    Cancelled {
        /// Stack name or id
        stack: String,
    },

    /// Polling exceeded the caller's deadline
    #[error("timed out after {elapsed:?} waiting for stack {stack}")]
    Timeout {
        /// Stack name or id
        stack: String,
        /// Time spent polling
        elapsed: Duration,
    },
}

impl Error {
    /// Create a transport error for a failed API call
    pub fn transport(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid-template error
    pub fn invalid_template(message: impl std::fmt::Display) -> Self {
        Self::InvalidTemplate {
            message: message.to_string(),
        }
    }

    /// Create an invariant-violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a provisioning failure with the provider's status and reason
    pub fn provisioning_failed(
        stack: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ProvisioningFailed {
            stack: stack.into(),
            status: status.into(),
            reason: reason.into(),
        }
    }

    /// Create an unexpected-state error
    pub fn unexpected_state(stack: impl Into<String>, status: impl Into<String>) -> Self {
        Self::UnexpectedState {
            stack: stack.into(),
            status: status.into(),
        }
    }

    /// Create an invalid-CIDR error
    pub fn invalid_cidr(
        context: impl Into<String>,
        cidr: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidCidr {
            context: context.into(),
            cidr: cidr.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error for a specific config field
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a config loading error
    pub fn config(path: impl Into<String>, msg: impl std::fmt::Display) -> Self {
        Self::Config {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Whether this error is a terminal outcome of a stack operation.
    ///
    /// Terminal outcomes leave the stack in place; the caller decides whether
    /// to destroy and retry. Everything else is a local or transport problem.
    pub fn is_terminal_stack_failure(&self) -> bool {
        matches!(
            self,
            Self::ProvisioningFailed { .. } | Self::UnexpectedState { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subnet_conflict_names_subnet_and_both_cidrs() {
        let err = Error::SubnetConflict {
            subnet_id: "subnet-aaa".to_string(),
            subnet_cidr: "10.0.1.0/24".to_string(),
            instance_cidr: "10.0.1.128/25".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("subnet-aaa"));
        assert!(msg.contains("10.0.1.0/24"));
        assert!(msg.contains("10.0.1.128/25"));
    }

    #[test]
    fn stale_topology_reports_both_cidrs() {
        let err = Error::StaleTopology {
            vpc_id: "vpc-123".to_string(),
            configured: "10.1.0.0/16".to_string(),
            live: "10.0.0.0/16".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("(10.1.0.0/16)"));
        assert!(msg.contains("(10.0.0.0/16)"));
        assert!(msg.contains("vpc-123"));
    }

    #[test]
    fn provisioning_failure_carries_reason() {
        let err = Error::provisioning_failed("mycluster", "CREATE_FAILED", "X");
        assert_eq!(err.to_string(), "stack mycluster reached CREATE_FAILED: X");
        match err {
            Error::ProvisioningFailed { reason, .. } => assert_eq!(reason, "X"),
            _ => panic!("Expected ProvisioningFailed variant"),
        }
    }

    #[test]
    fn transport_accepts_any_display() {
        let err = Error::transport("DescribeVpcs", "connection reset");
        assert_eq!(err.to_string(), "DescribeVpcs failed: connection reset");
    }

    #[test]
    fn validation_field_is_recorded() {
        match Error::validation_for_field("instanceCIDR", "must be inside vpcCIDR") {
            Error::Validation { field, message } => {
                assert_eq!(field.as_deref(), Some("instanceCIDR"));
                assert!(message.contains("inside"));
            }
            _ => panic!("Expected Validation variant"),
        }
    }

    #[test]
    fn terminal_failures_are_distinguished_from_transport() {
        assert!(Error::provisioning_failed("s", "UPDATE_FAILED", "r").is_terminal_stack_failure());
        assert!(Error::unexpected_state("s", "WEIRD").is_terminal_stack_failure());
        assert!(!Error::transport("DescribeStacks", "throttled").is_terminal_stack_failure());
        assert!(!Error::validation("bad").is_terminal_stack_failure());
    }
}
