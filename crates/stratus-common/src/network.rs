//! CIDR prefix arithmetic
//!
//! Thin wrapper over [`ipnet::IpNet`] with the two tests the conflict
//! validator needs: "contains point" and "overlaps with".

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use crate::Error;

/// A network prefix plus mask length
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cidr(IpNet);

impl Cidr {
    /// Parse a CIDR, tagging any failure with what the value describes
    pub fn parse(context: &str, text: &str) -> Result<Self, Error> {
        IpNet::from_str(text.trim())
            .map(Self)
            .map_err(|e| Error::invalid_cidr(context, text, e))
    }

    /// The base address of the prefix (host bits cleared)
    pub fn network(&self) -> IpAddr {
        self.0.network()
    }

    /// Prefix length in bits
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// Whether `addr` falls inside this prefix
    pub fn contains(&self, addr: IpAddr) -> bool {
        self.0.contains(&addr)
    }

    /// Whether `other` lies entirely inside this prefix
    pub fn contains_net(&self, other: &Cidr) -> bool {
        self.0.contains(&other.0)
    }

    /// Whether the two prefixes share any address.
    ///
    /// Prefixes are not totally ordered by containment, so the test runs in
    /// both directions: either base address inside the other prefix.
    pub fn overlaps(&self, other: &Cidr) -> bool {
        self.contains(other.network()) || other.contains(self.network())
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.network(), self.0.prefix_len())
    }
}
