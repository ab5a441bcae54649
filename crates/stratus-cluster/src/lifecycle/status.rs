//! Stack status classification
//!
//! Interpreting one describe response is a pure function so that the state
//! machine can be tested without a clock or a client. The poll driver in
//! [`super::poll`] only decides when to call it again.

use std::fmt;

use stratus_common::{Error, Result};

use crate::client::StackDescription;

/// Raw provider status strings
pub mod status {
    /// Create in flight
    pub const CREATE_IN_PROGRESS: &str = "CREATE_IN_PROGRESS";
    /// Create finished successfully
    pub const CREATE_COMPLETE: &str = "CREATE_COMPLETE";
    /// Create failed
    pub const CREATE_FAILED: &str = "CREATE_FAILED";
    /// Update in flight
    pub const UPDATE_IN_PROGRESS: &str = "UPDATE_IN_PROGRESS";
    /// Update finished successfully
    pub const UPDATE_COMPLETE: &str = "UPDATE_COMPLETE";
    /// Update failed
    pub const UPDATE_FAILED: &str = "UPDATE_FAILED";
    /// Update failed and was rolled back
    pub const UPDATE_ROLLBACK_COMPLETE: &str = "UPDATE_ROLLBACK_COMPLETE";
    /// Update failed and the rollback failed too
    pub const UPDATE_ROLLBACK_FAILED: &str = "UPDATE_ROLLBACK_FAILED";
}

/// The operation whose progress is being observed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackOperation {
    /// Stack creation
    Create,
    /// Stack update
    Update,
}

impl fmt::Display for StackOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Classified result of one status check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackStatus {
    /// Operation still in flight; poll again
    Pending,
    /// Terminal success
    Succeeded,
    /// Terminal failure
    Failed {
        /// Raw terminal status
        status: String,
        /// Provider status reason
        reason: String,
    },
    /// The stack does not exist
    NotFound,
}

impl StackStatus {
    /// Whether no further polling is needed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Classify a raw status string for the given operation.
    ///
    /// Any status outside the operation's known set is an
    /// [`Error::UnexpectedState`]; it is never treated as progress.
    pub fn from_raw(
        operation: StackOperation,
        stack: &str,
        raw: &str,
        reason: Option<&str>,
    ) -> Result<Self> {
        let failed = || Self::Failed {
            status: raw.to_string(),
            reason: reason.unwrap_or_default().to_string(),
        };

        let classified = match (operation, raw) {
            (StackOperation::Create, status::CREATE_IN_PROGRESS) => Self::Pending,
            (StackOperation::Create, status::CREATE_COMPLETE) => Self::Succeeded,
            (StackOperation::Create, status::CREATE_FAILED) => failed(),
            (StackOperation::Update, status::UPDATE_IN_PROGRESS) => Self::Pending,
            (StackOperation::Update, status::UPDATE_COMPLETE) => Self::Succeeded,
            (
                StackOperation::Update,
                status::UPDATE_FAILED
                | status::UPDATE_ROLLBACK_COMPLETE
                | status::UPDATE_ROLLBACK_FAILED,
            ) => failed(),
            _ => return Err(Error::unexpected_state(stack, raw)),
        };
        Ok(classified)
    }

    /// Classify a describe response.
    ///
    /// An empty response is [`StackStatus::NotFound`]; more than one stack
    /// for a single id is a control-plane invariant violation.
    pub fn from_describe(
        operation: StackOperation,
        stack: &str,
        stacks: &[StackDescription],
    ) -> Result<Self> {
        match stacks {
            [] => Ok(Self::NotFound),
            [only] => Self::from_raw(
                operation,
                stack,
                &only.stack_status,
                only.stack_status_reason.as_deref(),
            ),
            many => Err(Error::invariant(format!(
                "describe returned {} stacks for {}",
                many.len(),
                stack
            ))),
        }
    }
}
