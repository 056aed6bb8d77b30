#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use ::common::schemas::{InfoRow, SystemInfo};
use coord::core::discovery::{PeerDiscovery, StaticDiscovery};
use coord::core::node::{Liveness, PeerCandidate, ProbeReport};
use coord::core::probe::PeerProbe;
use coord::core::state::{BootConfig, DirJoin};

/// A scratch persistent mount, asset bundle and fake `voltdb` binary.
pub struct TestNode {
    pub dir: TempDir,
    pub mount: PathBuf,
    pub assets: PathBuf,
    pub bin_dir: PathBuf,
    pub init_log: PathBuf,
}

impl TestNode {
    pub fn new() -> Result<Self> {
        Self::with_init_exit(0)
    }

    /// The fake server records each invocation (cwd and args) in `init_log`
    /// and exits with `code`.
    pub fn with_init_exit(code: i32) -> Result<Self> {
        Self::build(code, true)
    }

    /// Like [`TestNode::new`] but `init` leaves the working directory empty.
    pub fn with_silent_init() -> Result<Self> {
        Self::build(0, false)
    }

    fn build(code: i32, touch_marker: bool) -> Result<Self> {
        let dir = TempDir::new()?;
        let mount = dir.path().join("voltdbroot");
        let assets = dir.path().join("assets");
        let bin_dir = dir.path().join("bin");
        let init_log = dir.path().join("init.log");

        std::fs::create_dir(&mount)?;
        std::fs::create_dir(&assets)?;
        std::fs::create_dir(&bin_dir)?;

        let marker = if touch_marker {
            "touch .initialized\n"
        } else {
            ""
        };
        let script = format!(
            "#!/bin/sh\necho \"$PWD $*\" >> '{}'\n{}exit {}\n",
            init_log.display(),
            marker,
            code
        );
        let server = bin_dir.join("voltdb");
        std::fs::write(&server, script)?;
        std::fs::set_permissions(&server, std::fs::Permissions::from_mode(0o755))?;

        Ok(Self {
            dir,
            mount,
            assets,
            bin_dir,
            init_log,
        })
    }

    pub fn config(&self, fqdn: &str) -> BootConfig {
        BootConfig {
            mount_root: self.mount.clone(),
            assets_dir: self.assets.clone(),
            init_args: Vec::new(),
            server_dir: Some(self.bin_dir.clone()),
            fqdn: Some(fqdn.to_string()),
            data_port: 3021,
            admin_port: 8080,
            probe_timeout: Duration::from_millis(300),
            info_timeout: Duration::from_millis(500),
            discovery_timeout: Duration::from_secs(1),
            discovery_cmd: "nslookup".to_string(),
            dir_join: DirJoin::Path,
            maintenance: false,
        }
    }

    pub fn add_asset(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.assets.join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// One line per `voltdb` invocation: `<cwd> <args...>`.
    pub fn init_calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.init_log)
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn working_dir(&self, name: impl AsRef<Path>) -> PathBuf {
        self.mount.join(name)
    }
}

pub fn argv(s: &str) -> Vec<String> {
    s.split_whitespace().map(String::from).collect()
}

/// Static discovery that also counts how often it was asked.
#[derive(Clone, Default)]
pub struct RecordingDiscovery {
    inner: StaticDiscovery,
    pub domains: Arc<Mutex<Vec<String>>>,
}

impl RecordingDiscovery {
    pub fn new(hosts: &[&str]) -> Self {
        Self {
            inner: StaticDiscovery::new(hosts.iter().copied()),
            domains: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.domains.lock().unwrap().clone()
    }
}

impl PeerDiscovery for RecordingDiscovery {
    async fn discover(&self, domain: &str) -> Vec<PeerCandidate> {
        self.domains.lock().unwrap().push(domain.to_string());
        self.inner.discover(domain).await
    }
}

/// Canned probe verdicts per host; unknown hosts are unreachable on both ports.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    reports: HashMap<String, ProbeReport>,
    info_fails: bool,
    pub probed: Arc<Mutex<Vec<String>>>,
    pub info_queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, host: &str, data: Liveness, admin: Liveness) -> Self {
        self.reports
            .insert(host.to_string(), ProbeReport { data, admin });
        self
    }

    pub fn failing_info(mut self) -> Self {
        self.info_fails = true;
        self
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn info_queries(&self) -> Vec<String> {
        self.info_queries.lock().unwrap().clone()
    }
}

impl PeerProbe for ScriptedProbe {
    async fn probe(&self, host: &str) -> ProbeReport {
        self.probed.lock().unwrap().push(host.to_string());
        self.reports.get(host).copied().unwrap_or(ProbeReport {
            data: Liveness::Unreachable,
            admin: Liveness::Unreachable,
        })
    }

    async fn query_info(&self, host: &str, _section: &str) -> Result<SystemInfo> {
        self.info_queries.lock().unwrap().push(host.to_string());
        if self.info_fails {
            return Err(anyhow!("connection reset by peer"));
        }
        Ok(SystemInfo {
            rows: vec![InfoRow {
                host_id: 0,
                key: "CLUSTERSTATE".into(),
                value: "RUNNING".into(),
            }],
        })
    }
}

/// A peer on loopback: a bare listener for the data port and an axum app
/// serving the admin API.
pub struct FakePeer {
    pub data_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    _data: TcpListener,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<()>>,
}

impl FakePeer {
    pub async fn new(sysinfo: Value) -> Result<Self> {
        let data = TcpListener::bind("127.0.0.1:0").await?;
        let data_addr = data.local_addr()?;

        let app = Router::new().route(
            "/api/1.0/",
            get(move || {
                let body = sysinfo.clone();
                async move { Json(body) }
            }),
        );

        let admin = TcpListener::bind("127.0.0.1:0").await?;
        let admin_addr = admin.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            axum::serve(admin, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .map_err(anyhow::Error::from)
        });

        Ok(Self {
            data_addr,
            admin_addr,
            _data: data,
            shutdown_tx,
            handle,
        })
    }

    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.handle.abort();
        let _ = self.handle.await;
        Ok(())
    }
}

pub fn overview_response() -> Value {
    json!({
        "status": 1,
        "appstatus": -128,
        "statusstring": null,
        "results": [{
            "status": -128,
            "schema": [
                {"name": "HOST_ID", "type": 5},
                {"name": "KEY", "type": 9},
                {"name": "VALUE", "type": 9}
            ],
            "data": [
                [0, "HOSTNAME", "db-0"],
                [0, "CLUSTERSTATE", "RUNNING"],
                [1, "HOSTNAME", "db-1"],
                [1, "CLUSTERSTATE", "RUNNING"]
            ]
        }]
    })
}

/// A loopback port nobody listens on.
pub async fn closed_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
