use anyhow::anyhow;
use url::Url;

use crate::constants::SYSINFO_PROCEDURE;

/// Admin API URL that runs `@SystemInformation` for `section` on `host`.
pub fn system_information_url(host: &str, port: u16, section: &str) -> anyhow::Result<Url> {
    let host = trim_root_dot(host.trim());
    if host.is_empty() {
        return Err(anyhow!("host cannot be empty"));
    }

    let mut url = Url::parse(&format!("http://{}:{}/api/1.0/", host, port))
        .map_err(|e| anyhow!("Invalid URL for host {}: {}", host, e))?;
    url.query_pairs_mut()
        .append_pair("Procedure", SYSINFO_PROCEDURE)
        .append_pair("Parameters", &format!("[\"{}\"]", section))
        .append_pair("admin", "true");

    Ok(url)
}

/// Drops the trailing root label dot of a DNS name (`a.b.` -> `a.b`).
pub fn trim_root_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}
