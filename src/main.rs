mod client;
mod commands;
mod config;
mod controller;
mod models;
mod runtime;
mod web;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::RosterClient;

/// Activity roster: browse activities and manage sign-ups.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print detailed API responses
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Path to config file
    #[arg(short = 'c', long, global = true, default_value = config::DEFAULT_CONFIG)]
    config: PathBuf,

    /// Override the activities API base URL from config
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the roster page
    Serve {
        /// Listen address (e.g. "0.0.0.0:3009"); defaults to the config value
        #[arg(short = 'a', long)]
        addr: Option<String>,
    },

    /// Print all activities and their participants
    List,

    /// Sign an email up for an activity
    ///
    /// Example:
    ///   signup "Chess Club" michael@mergington.edu
    Signup {
        #[arg(value_name = "ACTIVITY")]
        activity: String,
        #[arg(value_name = "EMAIL")]
        email: String,
    },

    /// Remove an email from an activity
    Unregister {
        #[arg(value_name = "ACTIVITY")]
        activity: String,
        #[arg(value_name = "EMAIL")]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cfg = config::load_or_default(&cli.config, cli.api_url.as_deref())?;

    match &cli.command {
        Command::Serve { addr } => {
            let addr = addr.clone().unwrap_or_else(|| cfg.server.addr.clone());
            web::serve(cfg, &addr).await?;
        }
        Command::List => {
            let api = RosterClient::new(&cfg.api)?;
            commands::run_list(&api).await?;
        }
        Command::Signup { activity, email } => {
            let api = RosterClient::new(&cfg.api)?;
            commands::run_signup(&api, activity, email).await?;
        }
        Command::Unregister { activity, email } => {
            let api = RosterClient::new(&cfg.api)?;
            commands::run_unregister(&api, activity, email).await?;
        }
    }

    Ok(())
}
