//! Externally visible cluster details read from stack resources

use std::fmt;

use tracing::debug;

use stratus_common::{Error, Result};

use crate::client::{continuation, StackClient, StackResourceSummary};

/// Logical id of the elastic IP attached to the controller
pub const CONTROLLER_EIP_LOGICAL_ID: &str = "EIPController";

/// Read-only snapshot of a deployed cluster
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterInfo {
    /// Cluster name
    pub name: String,
    /// Public address of the controller; empty if the stack has none
    pub controller_ip: String,
}

// Both labels end inside the same 8-column tab stop, so a single tab aligns
// the values.
impl fmt::Display for ClusterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cluster Name:\t{}", self.name)?;
        writeln!(f, "Controller IP:\t{}", self.controller_ip)
    }
}

/// List every resource of `stack_name`, following continuation tokens.
pub async fn list_stack_resources(
    client: &dyn StackClient,
    stack_name: &str,
) -> Result<Vec<StackResourceSummary>> {
    let mut resources = Vec::new();
    let mut next_token = None;
    loop {
        let page = client
            .list_stack_resources(stack_name, next_token)
            .await
            .map_err(|e| Error::transport("ListStackResources", e))?;
        resources.extend(page.resources);
        next_token = continuation(page.next_token);
        if next_token.is_none() {
            return Ok(resources);
        }
    }
}

/// Build [`ClusterInfo`] from a resource list.
///
/// Resources other than the controller address are ignored. The address
/// resource existing without a physical id means the stack is not usable
/// for discovery yet.
pub fn cluster_info_from_resources(
    stack_name: &str,
    resources: &[StackResourceSummary],
) -> Result<ClusterInfo> {
    let mut info = ClusterInfo {
        name: stack_name.to_string(),
        ..Default::default()
    };

    for r in resources {
        if r.logical_resource_id != CONTROLLER_EIP_LOGICAL_ID {
            continue;
        }
        match r.physical_resource_id.as_deref() {
            Some(ip) if !ip.is_empty() => info.controller_ip = ip.to_string(),
            _ => {
                return Err(Error::IncompleteStack {
                    stack: stack_name.to_string(),
                    logical_id: r.logical_resource_id.clone(),
                })
            }
        }
    }

    Ok(info)
}

/// Read [`ClusterInfo`] for a deployed stack.
pub async fn read_cluster_info(client: &dyn StackClient, stack_name: &str) -> Result<ClusterInfo> {
    let resources = list_stack_resources(client, stack_name).await?;
    debug!(stack = %stack_name, count = resources.len(), "listed stack resources");
    cluster_info_from_resources(stack_name, &resources)
}
