// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - a Telegram assistant bot.
//!
//! Binary entry point: load and validate configuration, then serve.

mod serve;

use clap::{Parser, Subcommand};
use herald_config::HeraldConfig;

/// Herald - a Telegram assistant bot.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Herald daemon (default).
    Serve,
    /// Load the configuration and print a summary without secrets.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match herald_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Config) => {
            print!("{}", render_config_summary(&config));
        }
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("herald: {e}");
                std::process::exit(1);
            }
        }
    }
}

/// Human-readable configuration summary. Never includes credential
/// material.
fn render_config_summary(config: &HeraldConfig) -> String {
    let webhook = match config.ingress.public_url.as_deref() {
        Some(url) => format!("registered against {url}"),
        None => "registration skipped (no public_url)".to_string(),
    };
    format!(
        "herald configuration:\n\
         \x20 model: {}\n\
         \x20 credentials: {} in pool\n\
         \x20 admins: {}\n\
         \x20 bind: {}:{}\n\
         \x20 webhook: {}\n\
         \x20 broadcast: every {} ms, progress every {}\n\
         \x20 history limit: {} turns\n",
        config.gemini.model,
        config.gemini.api_keys.len(),
        config.telegram.admin_ids.len(),
        config.ingress.host,
        config.ingress.port,
        webhook,
        config.broadcast.pace_ms,
        config.broadcast.progress_every,
        config.engine.history_limit,
    )
}
