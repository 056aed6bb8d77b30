use std::io;
use std::path::Path;

use tokio::fs;
use tracing::warn;

pub async fn file_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

pub async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// `true` when the directory has no entries. A missing directory counts as empty.
pub async fn dir_is_empty(path: &Path) -> io::Result<bool> {
    let mut entries = match fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    };
    Ok(entries.next_entry().await?.is_none())
}

/// Points `link` at `target`, replacing a previous symlink or file at `link`.
/// A real directory at `link` is left untouched.
pub async fn replace_symlink(target: &Path, link: &Path) -> io::Result<()> {
    match fs::symlink_metadata(link).await {
        Ok(m) if m.is_dir() => {
            warn!("not replacing directory '{}' with a symlink", link.display());
            return Ok(());
        }
        Ok(_) => fs::remove_file(link).await?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::symlink(target, link).await
}
