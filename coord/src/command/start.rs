use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tracing::debug;

use common::constants::{ADMIN_PORT, DATA_PORT, DEFAULT_ASSETS_DIR, PV_ROOT};
use common::error::BootError;

use crate::core::decide::{BootstrapDecider, Outcome};
use crate::core::discovery::SrvDiscovery;
use crate::core::probe::TcpProbe;
use crate::core::state::{BootConfig, DirJoin};

#[derive(Parser, Debug, Clone)]
pub struct StartArgs {
    /// Persistent volume mount point
    #[arg(long, env = "VOLTDB_PV_ROOT", default_value = PV_ROOT)]
    mount_root: PathBuf,

    /// Directory holding the deployment/classes/schema/license assets
    #[arg(long, env = "VOLTDB_INIT_VOLUME", default_value = DEFAULT_ASSETS_DIR)]
    assets_dir: PathBuf,

    /// Extra arguments appended to `voltdb init` on first run
    #[arg(long, env = "VOLTDB_INIT_ARGS", allow_hyphen_values = true)]
    init_args: Option<String>,

    /// Directory containing the server binary (default: next to this binary, else PATH)
    #[arg(long, env = "VOLTDB_BIN_DIR")]
    server_dir: Option<PathBuf>,

    /// Use this network name instead of `hostname -f`
    #[arg(long, env = "NODE_FQDN")]
    fqdn: Option<String>,

    /// Internal (data) port peers listen on
    #[arg(long, default_value_t = DATA_PORT)]
    data_port: u16,

    /// Admin HTTP port peers listen on
    #[arg(long, default_value_t = ADMIN_PORT)]
    admin_port: u16,

    /// TCP connect timeout per probe (milliseconds)
    #[arg(long, default_value_t = 2000)]
    probe_timeout_ms: u64,

    /// Timeout of the advisory system information query (milliseconds)
    #[arg(long, default_value_t = 3000)]
    info_timeout_ms: u64,

    /// Timeout of the discovery query (milliseconds)
    #[arg(long, default_value_t = 5000)]
    discovery_timeout_ms: u64,

    /// Resolver used for the SRV lookup
    #[arg(long, default_value = "nslookup")]
    discovery_cmd: String,

    /// How a `-D` value is combined with the host name
    #[arg(long, value_enum, default_value_t = DirJoin::Path)]
    dir_join: DirJoin,

    /// Keep the container up without starting the database; same as passing
    /// `--k8s-maintenance` to the server command
    #[arg(long = "k8s-maintenance")]
    maintenance: bool,
}

impl StartArgs {
    /// `argv0` is how this coordinator was invoked; a path there locates the
    /// server binary next to it.
    pub fn into_config(self, argv0: Option<&str>) -> BootConfig {
        let server_dir = self.server_dir.or_else(|| {
            argv0
                .and_then(|a| Path::new(a).parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        });

        BootConfig {
            mount_root: self.mount_root,
            assets_dir: self.assets_dir,
            init_args: self
                .init_args
                .as_deref()
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            server_dir,
            fqdn: self.fqdn,
            data_port: self.data_port,
            admin_port: self.admin_port,
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            info_timeout: Duration::from_millis(self.info_timeout_ms),
            discovery_timeout: Duration::from_millis(self.discovery_timeout_ms),
            discovery_cmd: self.discovery_cmd,
            dir_join: self.dir_join,
            maintenance: self.maintenance,
        }
    }
}

/// Runs the bootstrap decision with the real discovery and probes.
pub async fn start(config: BootConfig, command: Vec<String>) -> Result<Outcome, BootError> {
    debug!("config: {:?}", config);

    let discovery = SrvDiscovery::new(config.discovery_cmd.clone(), config.discovery_timeout);
    let probe = TcpProbe::new(
        config.data_port,
        config.admin_port,
        config.probe_timeout,
        config.info_timeout,
    )?;

    let mut decider = BootstrapDecider::new(config, discovery, probe);
    decider.run(command).await
}
