use std::future::Future;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use tokio::net::TcpStream;
use tracing::debug;

use common::schemas::{ProcedureResponse, SystemInfo};
use common::trace_context::inject_trace_context_reqwest;
use common::url_utils::system_information_url;

use crate::core::node::{Liveness, ProbeReport};

/// Liveness checks against a candidate peer, plus the advisory "describe
/// yourself" query on its admin port.
pub trait PeerProbe {
    fn probe(&self, host: &str) -> impl Future<Output = ProbeReport>;

    fn query_info(&self, host: &str, section: &str) -> impl Future<Output = Result<SystemInfo>>;
}

pub struct TcpProbe {
    http: Client,
    data_port: u16,
    admin_port: u16,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(
        data_port: u16,
        admin_port: u16,
        connect_timeout: Duration,
        info_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(info_timeout)
            .build()?;

        Ok(Self {
            http,
            data_port,
            admin_port,
            connect_timeout,
        })
    }
}

impl PeerProbe for TcpProbe {
    async fn probe(&self, host: &str) -> ProbeReport {
        let data = try_connect(host, self.data_port, self.connect_timeout).await;
        let admin = try_connect(host, self.admin_port, self.connect_timeout).await;
        ProbeReport { data, admin }
    }

    async fn query_info(&self, host: &str, section: &str) -> Result<SystemInfo> {
        let url = system_information_url(host, self.admin_port, section)?;
        debug!("GET {}", url);

        let resp = inject_trace_context_reqwest(self.http.get(url))
            .send()
            .await?
            .error_for_status()?;
        let body: ProcedureResponse = resp
            .json()
            .await
            .context("failed to parse system information response")?;

        if !body.is_success() {
            return Err(anyhow!(
                "procedure failed with status {}: {}",
                body.status,
                body.statusstring.as_deref().unwrap_or("")
            ));
        }

        Ok(body.into_system_info())
    }
}

/// Opens and immediately drops a TCP connection to `host:port`.
pub async fn try_connect(host: &str, port: u16, timeout: Duration) -> Liveness {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Liveness::Reachable,
        Ok(Err(e)) => {
            debug!("connect {}:{} failed: {}", host, port, describe(&e));
            Liveness::Unreachable
        }
        Err(_) => {
            debug!("connect {}:{} timed out after {:?}", host, port, timeout);
            Liveness::TimedOut
        }
    }
}

fn describe(e: &io::Error) -> String {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => "connection refused".to_string(),
        _ => e.to_string(),
    }
}
