//! Command-line interface for the file depot service.

mod commands;

use clap::{Parser, Subcommand};

/// Filedepot - file storage and insight backend
#[derive(Parser)]
#[command(name = "filedepot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default when no command is given)
    Serve,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Administrative account operations
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML, secrets omitted
    Show,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Set a new password for an account, bypassing old-password verification
    ResetPassword {
        /// Email of the account to reset
        email: String,

        /// New password; a random one is generated and printed when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

pub use commands::{cmd_admin_reset_password, cmd_config_show};
