//! HaloITSM automation plugin: ticket actions and lifecycle triggers driven
//! by JSON messages from the orchestration host.

use std::io::Write;
use std::process::ExitCode;

use log::{error, info};
use tokio::io::AsyncReadExt;

pub mod actions;
pub mod bridge;
pub mod config;
pub mod connection;
pub mod error;
pub mod input;
pub mod normalize;
pub mod secrets;
pub mod triggers;

#[cfg(test)]
mod test_support;

pub use actions::{run_action, ActionKind};
pub use config::{ConfigManager, ConnectionParams, TicketDefaults};
pub use connection::{Connection, ConnectionTestResult};
pub use error::{ErrorKind, PluginError, PluginResult};
pub use normalize::{minimal_ticket, normalize_ticket};
pub use triggers::{EventSink, Trigger, TriggerKind};

fn load_profile() -> Option<ConnectionParams> {
    ConfigManager::new()?.load()
}

/// Reads one host message from stdin, answers on stdout and reports the
/// outcome as the process exit code.
pub async fn run() -> ExitCode {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .target(env_logger::Target::Stderr)
    .try_init();

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            error!("Failed to load .env file: {}", err);
        }
    }

    info!("Starting HaloITSM plugin v{}", env!("CARGO_PKG_VERSION"));

    let mut raw = String::new();
    if let Err(err) = tokio::io::stdin().read_to_string(&mut raw).await {
        error!("Failed to read message from stdin: {}", err);
        return ExitCode::FAILURE;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = bridge::process(&raw, load_profile, &mut out).await;
    let _ = out.flush();

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("Failed to write response: {}", err);
            ExitCode::FAILURE
        }
    }
}
