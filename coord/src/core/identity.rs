use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::process::Command;
use tracing::{debug, warn};

use common::url_utils::trim_root_dot;

use crate::core::node::NodeIdentity;

/// What could be recovered from a name that doesn't follow `<group>-<ordinal>.<domain>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedIdentity {
    pub group_name: String,
    pub host_name: String,
    pub domain: Option<String>,
}

impl UnresolvedIdentity {
    pub fn ordinal_zero_host(&self) -> String {
        match &self.domain {
            Some(domain) => format!("{}-0.{}", self.group_name, domain),
            None => format!("{}-0", self.group_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Conforming(NodeIdentity),
    NonConforming(UnresolvedIdentity),
}

impl Resolution {
    pub fn group_name(&self) -> &str {
        match self {
            Resolution::Conforming(id) => &id.group_name,
            Resolution::NonConforming(u) => &u.group_name,
        }
    }
}

/// Splits `hostpart.domainpart` and `group-ordinal`. Never fails: names that
/// don't fit come back as [`Resolution::NonConforming`].
pub fn resolve(fqdn: &str) -> Resolution {
    let fqdn = trim_root_dot(fqdn.trim());
    let (host_name, domain) = match fqdn.split_once('.') {
        Some((h, d)) if !d.is_empty() => (h, Some(d)),
        Some((h, _)) => (h, None),
        None => (fqdn, None),
    };

    let (group_name, suffix) = match host_name.rsplit_once('-') {
        Some((g, s)) if !g.is_empty() => (g, Some(s)),
        _ => (host_name, None),
    };

    let ordinal = suffix.and_then(parse_ordinal);

    match (ordinal, domain) {
        (Some(ordinal), Some(domain)) if !group_name.is_empty() => {
            Resolution::Conforming(NodeIdentity {
                group_name: group_name.to_string(),
                ordinal,
                host_name: host_name.to_string(),
                domain: domain.to_string(),
            })
        }
        _ => Resolution::NonConforming(UnresolvedIdentity {
            group_name: group_name.to_string(),
            host_name: host_name.to_string(),
            domain: domain.map(str::to_string),
        }),
    }
}

// Canonical decimal only, so that "{group}-{ordinal}" reproduces the host name.
fn parse_ordinal(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if s.len() > 1 && s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

/// The node's fully-qualified name: explicit override, `hostname -f`, then `$HOSTNAME`.
pub async fn local_fqdn(explicit: Option<&str>, timeout: Duration) -> Result<String> {
    fqdn_from(explicit, "hostname", env::var("HOSTNAME").ok(), timeout).await
}

async fn fqdn_from(
    explicit: Option<&str>,
    hostname_cmd: &str,
    env_name: Option<String>,
    timeout: Duration,
) -> Result<String> {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(name.to_string());
    }

    match hostname_f(hostname_cmd, timeout).await {
        Ok(name) => return Ok(name),
        Err(e) => warn!("{} -f failed: {e:#}", hostname_cmd),
    }

    env_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("unable to determine the node's network name"))
}

async fn hostname_f(hostname_cmd: &str, timeout: Duration) -> Result<String> {
    let output = tokio::time::timeout(
        timeout,
        Command::new(hostname_cmd).arg("-f").kill_on_drop(true).output(),
    )
    .await
    .context("timed out")?
    .context("failed to run hostname")?;

    if !output.status.success() {
        return Err(anyhow!("exited with {}", output.status));
    }

    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!("hostname -f: {}", name);
    if name.is_empty() {
        return Err(anyhow!("empty output"));
    }
    Ok(name)
}
