use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

/// How a `-D` override is combined with the node's host name to name its
/// working directory under the mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DirJoin {
    /// `<host>/<override>`
    #[default]
    Path,
    /// `<host>.<override>`
    Dotted,
}

impl DirJoin {
    pub fn working_dir_name(self, host_name: &str, dir_override: &str) -> PathBuf {
        let dir_override = dir_override.trim_start_matches('/');
        match self {
            DirJoin::Path => PathBuf::from(host_name).join(dir_override),
            DirJoin::Dotted => PathBuf::from(format!("{}.{}", host_name, dir_override)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BootConfig {
    pub mount_root: PathBuf,
    pub assets_dir: PathBuf,
    pub init_args: Vec<String>,
    /// Directory the server binary lives in; `None` means look it up on `PATH`.
    pub server_dir: Option<PathBuf>,
    pub fqdn: Option<String>,

    pub data_port: u16,
    pub admin_port: u16,
    pub probe_timeout: Duration,
    pub info_timeout: Duration,
    pub discovery_timeout: Duration,
    pub discovery_cmd: String,
    pub dir_join: DirJoin,
    /// Maintenance requested among the coordinator's own options.
    pub maintenance: bool,
}

impl BootConfig {
    pub fn server_program(&self, server_name: &str) -> PathBuf {
        match &self.server_dir {
            Some(dir) => dir.join(server_name),
            None => PathBuf::from(server_name),
        }
    }
}
