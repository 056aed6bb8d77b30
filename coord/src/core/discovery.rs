use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::process::Command;
use tracing::{debug, info, warn};

use common::url_utils::trim_root_dot;

use crate::core::node::PeerCandidate;

/// Finds the hosts currently registered under a service domain.
///
/// Implementations return candidates sorted ascending and deduplicated. Any
/// failure is reported as "no peers visible yet", i.e. an empty list.
pub trait PeerDiscovery {
    fn discover(&self, domain: &str) -> impl Future<Output = Vec<PeerCandidate>>;
}

/// DNS SRV lookup through an external resolver tool (`nslookup -type=SRV`).
///
/// Each pod of a headless service shows up as one SRV answer whose target is
/// the pod's fully-qualified name:
///
/// ```text
/// db.default.svc.cluster.local  service = 10 50 0 db-0.db.default.svc.cluster.local.
/// ```
pub struct SrvDiscovery {
    command: String,
    timeout: Duration,
}

impl SrvDiscovery {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    async fn query(&self, domain: &str) -> Result<String> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.command)
                .arg("-type=SRV")
                .arg(domain)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| anyhow!("timed out after {:?}", self.timeout))?
        .with_context(|| format!("failed to run {}", self.command))?;

        // nslookup exits non-zero for NXDOMAIN, which just means nobody registered yet.
        if !output.status.success() {
            return Err(anyhow!("{} exited with {}", self.command, output.status));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl PeerDiscovery for SrvDiscovery {
    async fn discover(&self, domain: &str) -> Vec<PeerCandidate> {
        match self.query(domain).await {
            Ok(out) => {
                debug!("srv answers for {}:\n{}", domain, out);
                let peers = parse_srv_targets(&out);
                info!(domain, count = peers.len(), "discovered peers");
                peers
            }
            Err(e) => {
                warn!("srv lookup for {} failed, assuming no peers: {e:#}", domain);
                Vec::new()
            }
        }
    }
}

/// Extracts the SRV targets from resolver output, sorted and deduplicated.
pub fn parse_srv_targets(output: &str) -> Vec<PeerCandidate> {
    let hosts: BTreeSet<String> = output
        .lines()
        .filter(|line| line.contains("service ="))
        .filter_map(|line| line.split_whitespace().last())
        .map(|target| trim_root_dot(target).to_string())
        .filter(|target| !target.is_empty())
        .collect();

    hosts.into_iter().map(PeerCandidate::new).collect()
}

/// A fixed member list; handy for tests and for running outside a cluster.
#[derive(Clone, Debug, Default)]
pub struct StaticDiscovery {
    hosts: Vec<String>,
}

impl StaticDiscovery {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }
}

impl PeerDiscovery for StaticDiscovery {
    async fn discover(&self, _domain: &str) -> Vec<PeerCandidate> {
        let hosts: BTreeSet<&str> = self.hosts.iter().map(|h| trim_root_dot(h)).collect();
        hosts.into_iter().map(PeerCandidate::new).collect()
    }
}
