//! CLI argument parsing using clap 4.x derive macros

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voice-assistant skill for traffic updates, travel times and reminders
///
/// Handles host platform events either one at a time (`invoke`) or over
/// HTTP (`serve`).
#[derive(Parser, Debug)]
#[command(name = "plan-my-trip")]
#[command(author, about, long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PLAN_MY_TRIP_REVISION"), ")"))]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (default: <config dir>/plan-my-trip/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Handle a single event and print the response JSON
    Invoke {
        /// Event JSON file (reads stdin when omitted)
        #[arg(short, long)]
        event: Option<PathBuf>,

        /// Pretty-print the response
        #[arg(short, long)]
        pretty: bool,
    },

    /// Serve the skill over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Print the effective configuration with secrets masked
    Show,

    /// Write a template config file (no credentials)
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
