//! Common types for stratus: errors, cluster configuration, CIDR arithmetic

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod network;
pub mod telemetry;

pub use config::ClusterConfig;
pub use error::Error;
pub use network::Cidr;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Version of the stratus crates
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
