//! Stack-based cluster lifecycle for stratus
//!
//! Drives a declarative stack control plane through validate, create or
//! update, info and destroy for one cluster, and checks a new cluster's
//! instance subnet against an existing VPC before the first create.
//!
//! The control plane and network inventory are reached through the
//! [`client::StackClient`] and [`client::NetworkClient`] traits so callers
//! inject a provider SDK adapter and tests inject mocks.

#![deny(missing_docs)]

pub mod client;
pub mod cluster;
pub mod info;
pub mod lifecycle;
pub mod network;
pub mod validate;

pub use client::{ApiError, NetworkClient, StackClient};
pub use cluster::Cluster;
pub use info::ClusterInfo;
pub use lifecycle::{PollConfig, StackOperation, StackStatus};
pub use stratus_common::{ClusterConfig, Error, Result};
