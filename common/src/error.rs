use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::constants::{
    EXIT_EXEC_FAILED, EXIT_FAILURE, EXIT_INIT_FAILED, EXIT_MOUNT_MISSING, EXIT_USAGE,
};

#[derive(thiserror::Error, Debug)]
pub enum BootError {
    #[error("usage: expected `voltdb start ...` but found {found:?}")]
    Usage { found: Vec<String> },
    #[error("persistent volume '{}' is not mounted", .0.display())]
    MountMissing(PathBuf),
    #[error("failed initializing database at '{}': {reason}", dir.display())]
    InitFailed { dir: PathBuf, reason: String },
    #[error("failed to exec '{}'", program.display())]
    Exec {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl BootError {
    pub fn init_status(dir: PathBuf, status: ExitStatus) -> Self {
        BootError::InitFailed {
            dir,
            reason: format!("init exited with {status}"),
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootError::Usage { .. } => EXIT_USAGE,
            BootError::MountMissing(_) => EXIT_MOUNT_MISSING,
            BootError::InitFailed { .. } => EXIT_INIT_FAILED,
            BootError::Exec { .. } => EXIT_EXEC_FAILED,
            BootError::Io(_) => EXIT_FAILURE,
            BootError::Any(_) => EXIT_FAILURE,
        }
    }
}
