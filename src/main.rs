//! gpt5-mcp binary entry point.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gpt5_mcp::cli::{Cli, Commands, execute};
use gpt5_mcp::{Error, FileDefaults, LogLevel, QueryPipeline, ServerConfig, UpstreamClient};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, defaults_found) = match load_config(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => return startup_failure(&e),
    };

    init_tracing(config.log_level);

    if !defaults_found {
        warn!(path = %cli.config.display(), "defaults file not found, using built-in defaults");
    }

    info!(
        server = %config.server_name,
        version = %config.server_version,
        default_model = %config.default_model,
        timeout_ms = config.timeout.as_millis(),
        "starting"
    );

    let client = match UpstreamClient::new(&config) {
        Ok(client) => client,
        Err(e) => return startup_failure(&Error::from(e)),
    };
    let pipeline = Arc::new(QueryPipeline::new(&config, client));

    if serves_mcp(cli.command.as_ref()) && !pipeline.client().test_connection().await {
        warn!("OpenAI API is not reachable yet; serving anyway");
    }

    match execute(&cli, &config, pipeline).await {
        Ok(output) => {
            if !output.text.is_empty() {
                #[allow(clippy::print_stdout)]
                {
                    println!("{}", output.text);
                }
            }
            if output.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!(error = %e, "server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

/// Loads the defaults file and builds configuration.
///
/// Returns whether the defaults file was present.
fn load_config(path: &Path) -> Result<(ServerConfig, bool), Error> {
    let defaults = FileDefaults::load(path)?;
    let config = ServerConfig::from_env(defaults.as_ref())?;
    Ok((config, defaults.is_some()))
}

/// Logs go to stderr; stdout carries MCP traffic.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn serves_mcp(command: Option<&Commands>) -> bool {
    match command {
        None | Some(Commands::Stdio) => true,
        #[cfg(feature = "http")]
        Some(Commands::Http { .. }) => true,
        Some(_) => false,
    }
}

#[allow(clippy::print_stderr)]
fn startup_failure(e: &Error) -> ExitCode {
    eprintln!("Error: {e}");
    eprintln!("Hint: {}", e.hint());
    ExitCode::FAILURE
}
