//! labrig - command-line client for the LabRig API.
//!
//! Manages users, machines, and reservations against a LabRig deployment.
//! Configuration is resolved once at startup from defaults, the YAML config
//! file, environment variables, and flags; the authentication token is
//! cached in the OS keychain when one is available, falling back to an
//! access-restricted file.

mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod models;
mod output;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use config::ProcessEnv;

/// Initialize the tracing subscriber for logging.
/// Use the RUST_LOG env var to control the log level (e.g. RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let env = ProcessEnv;
    let config_file = config::config_file_path(cli.globals.config.clone(), &env);
    let cfg = config::resolve(&config_file, &env, &cli.globals.overrides())?;
    debug!(?cfg, "resolved configuration");

    output::apply_color_mode(cfg.color);

    match cli.command {
        Command::Login { username, password } => {
            commands::auth::login(&cfg, username, password).await
        }
        Command::Logout => commands::auth::logout(&cfg),
        Command::Whoami => commands::auth::whoami(&cfg).await,
        Command::Users { command } => commands::users::run(&cfg, command).await,
        Command::Signup {
            username,
            password,
            login,
        } => commands::users::signup(&cfg, username, password, login).await,
        Command::Machines { command } => commands::machines::run(&cfg, command).await,
        Command::Reservations => commands::reservations::list(&cfg).await,
        Command::Reserve {
            count,
            duration,
            password,
            as_user,
        } => commands::reservations::reserve(&cfg, count, duration, password, as_user).await,
        Command::Register { file } => commands::machines::register(&cfg, &file).await,
    }
}
