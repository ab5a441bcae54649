//! Cluster configuration
//!
//! `ClusterConfig` is the immutable identity and network topology of one
//! cluster. It is loaded from YAML and validated before any remote call; the
//! conflict validator only re-parses CIDRs, it never re-checks their syntax.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::network::Cidr;
use crate::{Error, Result};

/// Default VPC CIDR when none is configured
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";

/// Default instance subnet CIDR when none is configured
pub const DEFAULT_INSTANCE_CIDR: &str = "10.0.0.0/24";

/// Longest stack name the control plane accepts
const MAX_CLUSTER_NAME_LEN: usize = 128;

/// Identity and network topology of a single cluster
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Cluster name; also the name of the provisioned stack
    pub cluster_name: String,

    /// Region the cluster is provisioned in (e.g., "us-west-2")
    pub region: String,

    /// Existing VPC to provision into. A new VPC is created when unset.
    #[serde(default, rename = "vpcId", skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    /// CIDR of the VPC; must match the live VPC exactly when `vpc_id` is set
    #[serde(default = "default_vpc_cidr", rename = "vpcCIDR")]
    pub vpc_cidr: String,

    /// CIDR of the subnet this cluster creates for its instances
    #[serde(default = "default_instance_cidr", rename = "instanceCIDR")]
    pub instance_cidr: String,
}

fn default_vpc_cidr() -> String {
    DEFAULT_VPC_CIDR.to_string()
}

fn default_instance_cidr() -> String {
    DEFAULT_INSTANCE_CIDR.to_string()
}

impl ClusterConfig {
    /// Create a config with default network topology
    pub fn new(cluster_name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            region: region.into(),
            vpc_id: None,
            vpc_cidr: default_vpc_cidr(),
            instance_cidr: default_instance_cidr(),
        }
    }

    /// Use an existing VPC with the given CIDR
    pub fn with_existing_vpc(
        mut self,
        vpc_id: impl Into<String>,
        vpc_cidr: impl Into<String>,
    ) -> Self {
        self.vpc_id = Some(vpc_id.into());
        self.vpc_cidr = vpc_cidr.into();
        self
    }

    /// Set the instance subnet CIDR
    pub fn with_instance_cidr(mut self, instance_cidr: impl Into<String>) -> Self {
        self.instance_cidr = instance_cidr.into();
        self
    }

    /// Parse and validate a config from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::config("<inline>", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let data = std::fs::read_to_string(path).map_err(|e| Error::config(&source, e))?;
        let config: Self = serde_yaml::from_str(&data).map_err(|e| Error::config(&source, e))?;
        config.validate()?;
        debug!(path = %source, cluster = %config.cluster_name, "loaded cluster config");
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Checks the name is a legal stack name, both CIDRs parse, and the
    /// instance subnet lies inside the VPC.
    pub fn validate(&self) -> Result<()> {
        validate_cluster_name(&self.cluster_name)?;

        if self.region.trim().is_empty() {
            return Err(Error::validation_for_field("region", "region cannot be empty"));
        }

        if self.vpc_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(Error::validation_for_field("vpcId", "vpcId cannot be blank"));
        }
        if self.vpc_id.is_some() && self.vpc_cidr.trim().is_empty() {
            return Err(Error::validation_for_field(
                "vpcCIDR",
                "vpcCIDR is required when vpcId is set",
            ));
        }

        let vpc = Cidr::parse("vpc", &self.vpc_cidr)?;
        let instance = Cidr::parse("instance", &self.instance_cidr)?;
        if !vpc.contains_net(&instance) {
            return Err(Error::validation_for_field(
                "instanceCIDR",
                format!(
                    "instanceCIDR ({}) is not contained by vpcCIDR ({})",
                    self.instance_cidr, self.vpc_cidr
                ),
            ));
        }

        Ok(())
    }
}

fn validate_cluster_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation_for_field("clusterName", "clusterName cannot be empty"));
    }
    if name.len() > MAX_CLUSTER_NAME_LEN {
        return Err(Error::validation_for_field(
            "clusterName",
            format!("clusterName must be at most {} characters", MAX_CLUSTER_NAME_LEN),
        ));
    }
    let mut chars = name.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(Error::validation_for_field(
            "clusterName",
            format!("clusterName '{}' must start with a letter", name),
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::validation_for_field(
            "clusterName",
            format!(
                "clusterName '{}' may only contain letters, digits and hyphens",
                name
            ),
        ));
    }
    Ok(())
}
