use std::path::PathBuf;

use tracing::{info, instrument, warn};

use common::constants::{SERVER_BIN, SYSINFO_OVERVIEW};
use common::error::BootError;
use common::url_utils::trim_root_dot;

use crate::core::discovery::PeerDiscovery;
use crate::core::identity::{Resolution, local_fqdn, resolve};
use crate::core::invocation::Invocation;
use crate::core::launch::{LaunchSpec, derive_launch_spec};
use crate::core::node::{NodeIdentity, PeerCandidate};
use crate::core::probe::PeerProbe;
use crate::core::state::BootConfig;
use crate::core::storage::{AssetBundle, StorageInitializer, StorageState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapAction {
    /// Maintenance mode: keep the container up, don't start the database.
    Wait,
    /// A peer answered on its data port; join the cluster through it.
    JoinPeer(String),
    /// Nobody answered; point at ordinal 0 of the group.
    FallbackSelf(String),
}

#[derive(Debug)]
pub enum Outcome {
    Wait,
    Launch {
        action: BootstrapAction,
        storage: StorageState,
        spec: LaunchSpec,
    },
}

impl Outcome {
    pub fn action(&self) -> BootstrapAction {
        match self {
            Outcome::Wait => BootstrapAction::Wait,
            Outcome::Launch { action, .. } => action.clone(),
        }
    }
}

/// Decides whether this node joins a running peer or falls back to ordinal 0,
/// prepares its storage and produces the server command line. Performs no
/// irreversible handoff itself.
pub struct BootstrapDecider<D, P> {
    config: BootConfig,
    discovery: D,
    probe: P,
    storage: StorageInitializer,
}

impl<D: PeerDiscovery, P: PeerProbe> BootstrapDecider<D, P> {
    pub fn new(config: BootConfig, discovery: D, probe: P) -> Self {
        let storage = StorageInitializer::new(
            config.mount_root.clone(),
            AssetBundle::new(config.assets_dir.clone()),
            config.init_args.clone(),
            config.server_program(SERVER_BIN),
        );

        Self {
            config,
            discovery,
            probe,
            storage,
        }
    }

    #[instrument(name = "bootstrap", skip_all)]
    pub async fn run(&mut self, args: Vec<String>) -> Result<Outcome, BootError> {
        let invocation = Invocation::parse(args)?;
        info!("server command: {:?}", invocation.args());

        if self.config.maintenance || invocation.is_maintenance() {
            info!("maintenance mode requested, not starting the database");
            return Ok(Outcome::Wait);
        }

        self.storage.check_mount().await?;

        let fqdn = local_fqdn(self.config.fqdn.as_deref(), self.config.discovery_timeout).await?;
        let resolution = resolve(&fqdn);
        info!("resolved identity for '{}': {:?}", fqdn, resolution);

        let (action, host, dir_name) = match &resolution {
            Resolution::NonConforming(unresolved) => {
                warn!(
                    "'{}' is not an ordinal-named member, skipping discovery",
                    fqdn
                );
                let target = unresolved.ordinal_zero_host();
                (
                    BootstrapAction::FallbackSelf(target.clone()),
                    target,
                    PathBuf::from(trim_root_dot(fqdn.trim())),
                )
            }
            Resolution::Conforming(identity) => {
                let dir_name = self.working_dir_name(identity, &invocation);
                match self.select_peer(identity).await {
                    Some(peer) => (BootstrapAction::JoinPeer(peer.clone()), peer, dir_name),
                    None => {
                        let target = identity.ordinal_zero_host();
                        info!("no reachable peer, falling back to '{}'", target);
                        (
                            BootstrapAction::FallbackSelf(target.clone()),
                            target,
                            dir_name,
                        )
                    }
                }
            }
        };
        info!("bootstrap action: {:?}", action);

        let storage = self
            .storage
            .prepare(&dir_name, resolution.group_name())
            .await?;

        let working_dir = self.storage.working_dir(&dir_name)?;
        let assets = self.storage.assets();
        let license = assets.license().await;
        let deployment = assets.deployment().await;

        let spec = derive_launch_spec(
            self.config.server_program(invocation.server_name()),
            invocation.args(),
            &host,
            &working_dir,
            license.as_deref(),
            deployment.as_deref(),
        );
        info!("server cmd is {:?}", &spec.args[1..]);

        Ok(Outcome::Launch {
            action,
            storage,
            spec,
        })
    }

    /// `-D` override combined with the host name, else the full network name.
    pub fn working_dir_name(&self, identity: &NodeIdentity, invocation: &Invocation) -> PathBuf {
        match invocation.directory_override() {
            Some(dir) => self.config.dir_join.working_dir_name(&identity.host_name, dir),
            None => PathBuf::from(identity.fqdn()),
        }
    }

    /// Host name of the first candidate accepting connections, if any.
    async fn select_peer(&self, identity: &NodeIdentity) -> Option<String> {
        let candidates = self.discovery.discover(&identity.domain).await;
        info!(
            "cluster members in '{}': {:?}",
            identity.domain,
            candidates.iter().map(|c| c.host_name.as_str()).collect::<Vec<_>>()
        );

        self.first_reachable(&candidates)
            .await
            .map(|peer| peer.host_name.clone())
    }

    // Peers may be published before they accept traffic; the first one with
    // an open data port wins, no ranking.
    async fn first_reachable<'a>(
        &self,
        candidates: &'a [PeerCandidate],
    ) -> Option<&'a PeerCandidate> {
        for candidate in candidates {
            info!("Connecting to '{}'", candidate);
            let report = self.probe.probe(&candidate.host_name).await;
            info!(
                peer = %candidate,
                data = ?report.data,
                admin = ?report.admin,
                "probe result"
            );

            if !report.data.is_usable() {
                continue;
            }

            if report.admin.is_usable() {
                match self
                    .probe
                    .query_info(&candidate.host_name, SYSINFO_OVERVIEW)
                    .await
                {
                    Ok(info) => info!(
                        peer = %candidate,
                        cluster_state = info.get("CLUSTERSTATE").unwrap_or("unknown"),
                        version = info.get("VERSION").unwrap_or("unknown"),
                        hosts = info.host_count(),
                        "sysinfo"
                    ),
                    Err(e) => warn!("sysinfo from '{}' unavailable: {e:#}", candidate),
                }
            }

            return Some(candidate);
        }

        None
    }
}
