//! Network conflict validation against an existing VPC
//!
//! Before the first create into a pre-existing VPC, the instance subnet this
//! cluster will carve out must not overlap any subnet already present there.

use tracing::{debug, info};

use stratus_common::{Cidr, Error, Result};

use crate::client::{continuation, NetworkClient, Subnet};

/// Check that `instance_cidr` does not overlap any subnet of `vpc_id`.
///
/// Aborts with [`Error::StaleTopology`] before listing subnets when the live
/// VPC CIDR differs from `expected_vpc_cidr`: the caller's view of the
/// network cannot be trusted, so no subnet check would be meaningful.
pub async fn check_no_conflict(
    client: &dyn NetworkClient,
    region: &str,
    vpc_id: &str,
    expected_vpc_cidr: &str,
    instance_cidr: &str,
) -> Result<()> {
    let mut vpcs = client
        .describe_vpcs(&[vpc_id.to_string()])
        .await
        .map_err(|e| Error::transport("DescribeVpcs", e))?;

    let vpc = match vpcs.len() {
        0 => {
            return Err(Error::VpcNotFound {
                vpc_id: vpc_id.to_string(),
                region: region.to_string(),
            })
        }
        1 => vpcs.remove(0),
        count => {
            return Err(Error::AmbiguousVpc {
                vpc_id: vpc_id.to_string(),
                count,
            })
        }
    };

    // Exact text comparison, not semantic prefix equality
    if vpc.cidr_block != expected_vpc_cidr {
        return Err(Error::StaleTopology {
            vpc_id: vpc.vpc_id,
            configured: expected_vpc_cidr.to_string(),
            live: vpc.cidr_block,
        });
    }

    let subnets = list_subnets(client, &vpc.vpc_id).await?;
    debug!(vpc_id = %vpc.vpc_id, count = subnets.len(), "checking existing subnets for conflicts");

    find_conflict(instance_cidr, subnets)?;

    info!(vpc_id = %vpc.vpc_id, instance_cidr = %instance_cidr, "no subnet conflicts found");
    Ok(())
}

/// List every subnet of a VPC, following continuation tokens.
pub async fn list_subnets(client: &dyn NetworkClient, vpc_id: &str) -> Result<Vec<Subnet>> {
    let mut subnets = Vec::new();
    let mut next_token = None;
    loop {
        let page = client
            .describe_subnets(vpc_id, next_token)
            .await
            .map_err(|e| Error::transport("DescribeSubnets", e))?;
        subnets.extend(page.subnets);
        next_token = continuation(page.next_token);
        if next_token.is_none() {
            return Ok(subnets);
        }
    }
}

/// Report the first subnet, by subnet id, that overlaps `instance_cidr`.
fn find_conflict(instance_cidr: &str, mut subnets: Vec<Subnet>) -> Result<()> {
    let candidate = Cidr::parse("instance", instance_cidr)?;

    subnets.sort_by(|a, b| a.subnet_id.cmp(&b.subnet_id));

    for subnet in subnets {
        let existing = Cidr::parse("existing subnet", &subnet.cidr_block)?;
        if existing.overlaps(&candidate) {
            return Err(Error::SubnetConflict {
                subnet_id: subnet.subnet_id,
                subnet_cidr: existing.to_string(),
                instance_cidr: candidate.to_string(),
            });
        }
    }
    Ok(())
}
