use std::io::{self, Write};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use common::constants::{DIR_FLAGS, HOST_FLAGS, LICENSE_FLAGS};
use common::error::BootError;

use crate::core::invocation::{FlagMatch, has_flag, is_flag_value, match_flag};

/// Everything needed to replace this process with the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    /// Full argv, `args[0]` is the server name.
    pub args: Vec<String>,
    pub host: String,
    pub working_dir: PathBuf,
    pub license: Option<PathBuf>,
    /// Deployment descriptor found in the asset bundle at launch time; only
    /// `init` consumes it, it is recorded here for the launch log.
    pub deployment: Option<PathBuf>,
}

/// Builds the final server command line from the original one.
///
/// * `-H`/`--host` always ends up pointing at `host`.
/// * `-D`/`--dir`/`--directory` is pointed at `working_dir`, only if given.
/// * `-L <license>` is added when a license asset exists and none was given.
pub fn derive_launch_spec(
    program: PathBuf,
    original: &[String],
    host: &str,
    working_dir: &Path,
    license: Option<&Path>,
    deployment: Option<&Path>,
) -> LaunchSpec {
    let dir = working_dir.to_string_lossy();

    let mut args = rewrite_flag(original, HOST_FLAGS, host);
    args = rewrite_flag(&args, DIR_FLAGS, &dir);

    if !has_flag(&args, HOST_FLAGS) {
        args.push(HOST_FLAGS[0].to_string());
        args.push(host.to_string());
    }

    let license = match license {
        Some(path) if !has_flag(original, LICENSE_FLAGS) => {
            args.push(LICENSE_FLAGS[0].to_string());
            args.push(path.to_string_lossy().into_owned());
            Some(path.to_path_buf())
        }
        _ => None,
    };

    LaunchSpec {
        program,
        args,
        host: host.to_string(),
        working_dir: working_dir.to_path_buf(),
        license,
        deployment: deployment.map(Path::to_path_buf),
    }
}

/// Replaces the value of every occurrence of `flags` with `value`, keeping
/// the spelling. A flag without a value gets `value` inserted after it.
fn rewrite_flag(args: &[String], flags: &[&str], value: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 1);
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        match match_flag(arg, flags) {
            Some(FlagMatch::Separate) => {
                out.push(arg.clone());
                iter.next_if(|next| is_flag_value(next));
                out.push(value.to_string());
            }
            Some(FlagMatch::Inline { prefix, .. }) => out.push(format!("{}{}", prefix, value)),
            None => out.push(arg.clone()),
        }
    }

    out
}

impl LaunchSpec {
    /// Hands the process over to the server. Only returns on failure.
    pub fn exec(self) -> BootError {
        info!(
            program = %self.program.display(),
            dir = %self.working_dir.display(),
            "Starting server: {:?}",
            &self.args[1..]
        );
        if let Some(deployment) = &self.deployment {
            info!("deployment descriptor: {}", deployment.display());
        }

        // Output written after exec belongs to the server, make sure ours is out.
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        let err = Command::new(&self.program)
            .arg0(&self.args[0])
            .args(&self.args[1..])
            .current_dir(&self.working_dir)
            .exec();

        BootError::Exec {
            program: self.program,
            source: err,
        }
    }
}
