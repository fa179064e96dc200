use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "expiryguard")]
#[command(version, about = "ExpiryGuard - expiry notifications for secrets and certificates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ~/.expiryguard/config.toml)
    #[arg(long, global = true, env = "EXPIRYGUARD_CONFIG")]
    pub config: Option<String>,

    /// Database path (defaults to ~/.expiryguard/expiryguard.db)
    #[arg(long, global = true, env = "EXPIRYGUARD_DB_PATH")]
    pub db_path: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the notification daemon on the configured schedule
    Run,

    /// Execute a single reconciliation pass and exit
    Once,

    /// Secret management
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },

    /// Send a test email through the configured SMTP channel
    TestEmail {
        /// Recipient address
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Add a secret to monitor
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Expiry date (YYYY-MM-DD)
        #[arg(long)]
        expires: String,

        /// Owner email address notifications are sent to
        #[arg(long)]
        owner: String,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List monitored secrets
    List {
        /// Include deactivated secrets
        #[arg(long)]
        all: bool,
    },

    /// Stop monitoring a secret (soft delete; the record is kept)
    Remove {
        /// Secret id
        id: String,
    },
}
