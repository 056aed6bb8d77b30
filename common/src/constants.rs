use std::time::Duration;

/// Mount point of the per-node persistent volume.
pub const PV_ROOT: &str = "/voltdbroot";
/// Where the deployment assets (configmap) are mounted when unset.
pub const DEFAULT_ASSETS_DIR: &str = "/etc/voltdb";

pub const SERVER_BIN: &str = "voltdb";
pub const START_SUBCOMMAND: &str = "start";
pub const INIT_SUBCOMMAND: &str = "init";

pub const MAINTENANCE_FLAG: &str = "--k8s-maintenance";
pub const MAINTENANCE_SLEEP: Duration = Duration::from_secs(10_000);

pub const DATA_PORT: u16 = 3021;
pub const ADMIN_PORT: u16 = 8080;

pub const ASSET_DEPLOYMENT: &str = "deployment";
pub const ASSET_CLASSES: &str = "classes";
pub const ASSET_SCHEMA: &str = "schema";
pub const ASSET_LICENSE: &str = "license";

pub const HOST_FLAGS: &[&str] = &["-H", "--host"];
pub const DIR_FLAGS: &[&str] = &["-D", "--dir", "--directory"];
pub const LICENSE_FLAGS: &[&str] = &["-L", "--license"];

pub const SYSINFO_PROCEDURE: &str = "@SystemInformation";
pub const SYSINFO_OVERVIEW: &str = "OVERVIEW";

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_MOUNT_MISSING: i32 = 3;
pub const EXIT_INIT_FAILED: i32 = 4;
pub const EXIT_EXEC_FAILED: i32 = 5;
