use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use anyhow::anyhow;
use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};

use common::constants::{
    ASSET_CLASSES, ASSET_DEPLOYMENT, ASSET_LICENSE, ASSET_SCHEMA, INIT_SUBCOMMAND,
};
use common::error::BootError;
use common::file_utils::{dir_exists, dir_is_empty, file_exists, replace_symlink};

/// The read-only assets mounted into the container (usually from a configmap).
/// Each file is optional; names are fixed.
#[derive(Clone, Debug)]
pub struct AssetBundle {
    dir: PathBuf,
}

impl AssetBundle {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn asset(&self, name: &str) -> Option<PathBuf> {
        let path = self.dir.join(name);
        file_exists(&path).await.then_some(path)
    }

    pub async fn deployment(&self) -> Option<PathBuf> {
        self.asset(ASSET_DEPLOYMENT).await
    }

    pub async fn classes(&self) -> Option<PathBuf> {
        self.asset(ASSET_CLASSES).await
    }

    pub async fn schema(&self) -> Option<PathBuf> {
        self.asset(ASSET_SCHEMA).await
    }

    pub async fn license(&self) -> Option<PathBuf> {
        self.asset(ASSET_LICENSE).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageState {
    pub mount_present: bool,
    pub working_dir_exists: bool,
    pub working_dir_empty: bool,
}

impl StorageState {
    pub async fn inspect(mount_root: &Path, working_dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            mount_present: dir_exists(mount_root).await,
            working_dir_exists: dir_exists(working_dir).await,
            working_dir_empty: dir_is_empty(working_dir).await?,
        })
    }

    pub fn first_run(&self) -> bool {
        !self.working_dir_exists || self.working_dir_empty
    }
}

/// Owns this node's working directory under the persistent mount and runs
/// `<server> init` into it the first time it is found empty.
pub struct StorageInitializer {
    mount_root: PathBuf,
    assets: AssetBundle,
    init_args: Vec<String>,
    server_program: PathBuf,
    initialized: HashSet<PathBuf>,
}

impl StorageInitializer {
    pub fn new(
        mount_root: impl Into<PathBuf>,
        assets: AssetBundle,
        init_args: Vec<String>,
        server_program: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mount_root: mount_root.into(),
            assets,
            init_args,
            server_program: server_program.into(),
            initialized: HashSet::new(),
        }
    }

    pub fn assets(&self) -> &AssetBundle {
        &self.assets
    }

    /// Missing mount means the deployment has no storage backing at all.
    pub async fn check_mount(&self) -> Result<(), BootError> {
        if dir_exists(&self.mount_root).await {
            Ok(())
        } else {
            Err(BootError::MountMissing(self.mount_root.clone()))
        }
    }

    pub fn working_dir(&self, name: &Path) -> Result<PathBuf, BootError> {
        let escapes = name.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || name.as_os_str().is_empty() {
            return Err(BootError::Any(anyhow!(
                "working directory '{}' must be a relative path inside the mount",
                name.display()
            )));
        }
        Ok(self.mount_root.join(name))
    }

    /// Inspects `<mount>/<name>` and initializes it when empty. Returns the
    /// state observed before any initialization.
    pub async fn prepare(&mut self, name: &Path, alias: &str) -> Result<StorageState, BootError> {
        self.check_mount().await?;

        let working_dir = self.working_dir(name)?;
        let state = StorageState::inspect(&self.mount_root, &working_dir).await?;
        info!(
            dir = %working_dir.display(),
            exists = state.working_dir_exists,
            empty = state.working_dir_empty,
            "storage state"
        );

        if state.first_run() && !self.initialized.contains(&working_dir) {
            self.initialize(&working_dir, name, alias).await?;
            self.initialized.insert(working_dir);
        }

        Ok(state)
    }

    async fn initialize(
        &self,
        working_dir: &Path,
        name: &Path,
        alias: &str,
    ) -> Result<(), BootError> {
        info!("Initializing a new database at '{}'", working_dir.display());
        fs::create_dir_all(working_dir).await?;

        let args = self.init_command_args().await;
        info!("Init command: {} {:?}", self.server_program.display(), args);

        let status = Command::new(&self.server_program)
            .args(&args)
            .current_dir(working_dir)
            .status()
            .await
            .map_err(|e| BootError::InitFailed {
                dir: working_dir.to_path_buf(),
                reason: format!("failed to run {}: {}", self.server_program.display(), e),
            })?;

        if !status.success() {
            return Err(BootError::init_status(working_dir.to_path_buf(), status));
        }
        info!("Initialized new database at '{}'", working_dir.display());

        if !alias.is_empty() {
            let link = self.mount_root.join(alias);
            match replace_symlink(name, &link).await {
                Ok(()) => info!("linked '{}' -> '{}'", link.display(), name.display()),
                Err(e) => warn!("failed to link '{}': {}", link.display(), e),
            }
        }

        Ok(())
    }

    /// `init [--config f] [--classes f] [--schema f] [extra args...]`
    pub async fn init_command_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![INIT_SUBCOMMAND.into()];

        if let Some(path) = self.assets.deployment().await {
            args.push("--config".into());
            args.push(path.into_os_string());
        }
        if let Some(path) = self.assets.classes().await {
            args.push("--classes".into());
            args.push(path.into_os_string());
        }
        if let Some(path) = self.assets.schema().await {
            args.push("--schema".into());
            args.push(path.into_os_string());
        }
        args.extend(self.init_args.iter().map(OsString::from));

        args
    }
}
