//! Cluster handle
//!
//! [`Cluster`] binds one [`ClusterConfig`] to the injected control-plane
//! clients. Every operation re-queries the provider; nothing is cached
//! between calls.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use stratus_common::{ClusterConfig, Result};

use crate::client::{NetworkClient, StackClient};
use crate::info::{read_cluster_info, ClusterInfo};
use crate::lifecycle::{PollConfig, StackLifecycle};
use crate::validate::validate_stack;

/// Handle for a single cluster stack
pub struct Cluster {
    config: ClusterConfig,
    stacks: Arc<dyn StackClient>,
    network: Arc<dyn NetworkClient>,
    poll: PollConfig,
    cancel: Option<CancellationToken>,
}

impl Cluster {
    /// Create a handle for `config` using clients bound to `config.region`
    pub fn new(
        config: ClusterConfig,
        stacks: Arc<dyn StackClient>,
        network: Arc<dyn NetworkClient>,
    ) -> Self {
        Self {
            config,
            stacks,
            network,
            poll: PollConfig::default(),
            cancel: None,
        }
    }

    /// Override the polling interval and deadline
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Abort create/update polling when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Configuration this handle is bound to
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    fn lifecycle(&self) -> StackLifecycle<'_> {
        StackLifecycle::new(self.stacks.as_ref(), &self.poll)
            .with_cancellation(self.cancel.as_ref())
    }

    /// Validate `template_body` and return the provider's report.
    ///
    /// Before the stack exists in a pre-existing VPC this also checks the
    /// instance subnet against the live subnets of that VPC.
    #[instrument(skip(self, template_body), fields(cluster = %self.config.cluster_name))]
    pub async fn validate(&self, template_body: &str) -> Result<String> {
        validate_stack(
            self.stacks.as_ref(),
            self.network.as_ref(),
            &self.config,
            template_body,
        )
        .await
    }

    /// Create the stack and wait until it is complete
    #[instrument(skip(self, template_body), fields(cluster = %self.config.cluster_name))]
    pub async fn create(&self, template_body: &str) -> Result<()> {
        let stack_id = self
            .lifecycle()
            .create(&self.config.cluster_name, template_body)
            .await?;
        info!(stack_id = %stack_id, "cluster stack created");
        Ok(())
    }

    /// Update the stack, wait until it is complete and describe the update
    #[instrument(skip(self, template_body), fields(cluster = %self.config.cluster_name))]
    pub async fn update(&self, template_body: &str) -> Result<String> {
        let output = self
            .lifecycle()
            .update(&self.config.cluster_name, template_body)
            .await?;
        Ok(output.to_string())
    }

    /// Read the externally visible details of the deployed cluster
    #[instrument(skip(self), fields(cluster = %self.config.cluster_name))]
    pub async fn info(&self) -> Result<ClusterInfo> {
        read_cluster_info(self.stacks.as_ref(), &self.config.cluster_name).await
    }

    /// Request deletion of the stack; does not wait for it to finish
    #[instrument(skip(self), fields(cluster = %self.config.cluster_name))]
    pub async fn destroy(&self) -> Result<()> {
        self.lifecycle().destroy(&self.config.cluster_name).await
    }
}
