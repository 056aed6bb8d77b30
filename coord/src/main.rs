use clap::Parser;
use tracing::{debug, error, info};

use common::constants::MAINTENANCE_SLEEP;
use common::error::BootError;
use common::telemetry::{TelemetryGuard, init_telemetry};

use coord::command::start::{StartArgs, start};
use coord::core::decide::Outcome;

/// Startup entrypoint for a database node in an ordinal-named group: decides
/// whether to join a running peer or point at ordinal 0, prepares storage and
/// execs `voltdb start` with the right host.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    start: StartArgs,

    /// The server command line, e.g. `voltdb start -c 3`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let telemetry = init_telemetry("coord");

    let args = Args::parse();
    let argv0 = std::env::args().next();
    info!("args: {:?}", std::env::args().collect::<Vec<_>>());
    for (k, v) in std::env::vars().filter(|(k, _)| k.starts_with("VOLTDB_")) {
        debug!("env {}={}", k, v);
    }

    let config = args.start.into_config(argv0.as_deref());

    match start(config, args.command).await {
        Ok(Outcome::Wait) => {
            // Liveness checks will likely fail while we sit here.
            telemetry.flush();
            loop {
                tokio::time::sleep(MAINTENANCE_SLEEP).await;
            }
        }
        Ok(Outcome::Launch { spec, .. }) => {
            telemetry.flush();
            let err = spec.exec();
            exit_with(err, &telemetry);
        }
        Err(err) => exit_with(err, &telemetry),
    }
}

fn exit_with(err: BootError, telemetry: &TelemetryGuard) -> ! {
    let code = err.exit_code();
    error!("ERROR: {:#}", anyhow::Error::new(err));
    telemetry.flush();
    std::process::exit(code);
}
