use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url_frontend::{
    AppShell,
    cli::{self, Cli},
    config::{AppConfig, Env},
};

/// main
///
/// Entry point of the client shell: configuration, logging, shell assembly,
/// then a single CLI command.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let args = Cli::parse();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise only this crate logs, at info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "url_frontend=info".into());

    // 3. Initialize Logging based on Environment
    // Logs go to stderr so command output on stdout stays clean.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
    }

    tracing::debug!("client starting in {:?} mode", config.env);

    // 4. Shell Assembly (transport, persistence, routes, session restore)
    let mut shell = match AppShell::bootstrap(config).await {
        Ok(shell) => shell,
        Err(error) => {
            tracing::error!(%error, "failed to start client shell");
            return ExitCode::FAILURE;
        }
    };

    // 5. Command Dispatch
    cli::run(&mut shell, args.command).await
}
