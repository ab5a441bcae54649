//! Stack lifecycle: create, update and destroy.
//!
//! Each operation is `Submitted -> Polling -> {Succeeded | Failed}`. Create
//! and update poll the stack id returned by the submit call; destroy returns
//! as soon as the delete request is accepted. Nothing here retries: a failed
//! operation is reported and the caller decides whether to tear down.

mod poll;
pub mod status;

pub use poll::{wait_for_stack, PollConfig, DEFAULT_POLL_INTERVAL};
pub use status::{StackOperation, StackStatus};

use tokio_util::sync::CancellationToken;
use tracing::info;

use stratus_common::{Error, Result};

use crate::client::{
    CreateStackRequest, OnFailure, StackClient, UpdateStackOutput, UpdateStackRequest,
    CAPABILITY_IAM,
};

/// Drives stack operations for a single stack name
pub struct StackLifecycle<'a> {
    client: &'a dyn StackClient,
    poll: &'a PollConfig,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> StackLifecycle<'a> {
    /// Create a lifecycle controller over `client`
    pub fn new(client: &'a dyn StackClient, poll: &'a PollConfig) -> Self {
        Self {
            client,
            poll,
            cancel: None,
        }
    }

    /// Stop polling early when `token` is cancelled
    pub fn with_cancellation(mut self, token: Option<&'a CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Create the stack and wait for `CREATE_COMPLETE`.
    ///
    /// Failed creates keep their resources (`OnFailure::DoNothing`) so they
    /// can be inspected. Returns the new stack id.
    pub async fn create(&self, stack_name: &str, template_body: &str) -> Result<String> {
        let request = CreateStackRequest {
            stack_name: stack_name.to_string(),
            template_body: template_body.to_string(),
            on_failure: OnFailure::DoNothing,
            capabilities: vec![CAPABILITY_IAM.to_string()],
        };

        let stack_id = self
            .client
            .create_stack(&request)
            .await
            .map_err(|e| Error::transport("CreateStack", e))?;
        info!(stack = %stack_name, stack_id = %stack_id, "stack create submitted");

        wait_for_stack(
            self.client,
            self.poll,
            self.cancel,
            StackOperation::Create,
            &stack_id,
        )
        .await?;
        Ok(stack_id)
    }

    /// Update the stack and wait for `UPDATE_COMPLETE`.
    pub async fn update(&self, stack_name: &str, template_body: &str) -> Result<UpdateStackOutput> {
        let request = UpdateStackRequest {
            stack_name: stack_name.to_string(),
            template_body: template_body.to_string(),
            capabilities: vec![CAPABILITY_IAM.to_string()],
        };

        let output = self
            .client
            .update_stack(&request)
            .await
            .map_err(|e| Error::transport("UpdateStack", e))?;
        info!(stack = %stack_name, stack_id = %output.stack_id, "stack update submitted");

        wait_for_stack(
            self.client,
            self.poll,
            self.cancel,
            StackOperation::Update,
            &output.stack_id,
        )
        .await?;
        Ok(output)
    }

    /// Submit a delete without waiting for it to finish.
    pub async fn destroy(&self, stack_name: &str) -> Result<()> {
        self.client
            .delete_stack(stack_name)
            .await
            .map_err(|e| Error::transport("DeleteStack", e))?;
        info!(stack = %stack_name, "stack delete submitted");
        Ok(())
    }
}
