use std::fmt;

use serde::{Deserialize, Serialize};

/// Where this node sits in its ordinal-named group, e.g. `db-2` in `db.default.svc`.
#[derive(Clone, Debug, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub struct NodeIdentity {
    pub group_name: String,
    pub ordinal: u32,
    pub host_name: String, // always "{group_name}-{ordinal}"
    pub domain: String,
}

impl NodeIdentity {
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.host_name, self.domain)
    }

    /// Fully-qualified name of ordinal 0 of this group.
    pub fn ordinal_zero_host(&self) -> String {
        format!("{}-0.{}", self.group_name, self.domain)
    }

    pub fn is_ordinal_zero(&self) -> bool {
        self.ordinal == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerCandidate {
    pub host_name: String,
}

impl PeerCandidate {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
        }
    }
}

impl fmt::Display for PeerCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host_name)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Liveness {
    Reachable,
    Unreachable,
    TimedOut,
}

impl Liveness {
    /// Refusals and timeouts are equally useless to the caller.
    pub fn is_usable(self) -> bool {
        self == Liveness::Reachable
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeReport {
    pub data: Liveness,
    pub admin: Liveness,
}
