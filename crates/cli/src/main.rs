//! Hosthub CLI - store initialization and account management tools.
//!
//! # Usage
//!
//! ```bash
//! # Seed bootstrap admin records and the system config singleton
//! hosthub init
//!
//! # Ensure an admin record exists for an identity
//! hosthub admin ensure -u some-uid -n "Operator Name"
//!
//! # Provision a host, extend and inspect subscriptions
//! hosthub host create -u some-uid --username acme -e ops@acme.example
//! hosthub host extend -i some-uid -d 90 --note "annual renewal"
//! hosthub host list
//!
//! # Browse the audit history
//! hosthub history --since-days 30
//! ```
//!
//! # Commands
//!
//! - `init` - Seed the well-known store documents
//! - `admin ensure` - Create an admin record if absent
//! - `host` - Provision, extend, suspend, reactivate, list, remove hosts
//! - `history` - Filterable audit history

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hosthub")]
#[command(author, version, about = "Hosthub control-plane CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed bootstrap admin records and the system config singleton
    Init,
    /// Manage admin records
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage host accounts and their subscriptions
    Host {
        #[command(subcommand)]
        action: HostAction,
    },
    /// Browse the subscription audit history
    History {
        /// Only this host id
        #[arg(long)]
        host: Option<String>,

        /// Case-insensitive match on host name or email
        #[arg(short, long)]
        query: Option<String>,

        /// Only hosts with activity in the last N days
        #[arg(long)]
        since_days: Option<i64>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create an admin record for a UID if one does not exist
    Ensure {
        /// Identity-store UID
        #[arg(short, long)]
        uid: String,

        /// Display name (default: "admin")
        #[arg(short = 'n', long)]
        username: Option<String>,
    },
}

#[derive(Subcommand)]
enum HostAction {
    /// Provision a new host account
    Create {
        /// Identity-store UID of the host account
        #[arg(short, long)]
        uid: String,

        /// Host display name
        #[arg(long)]
        username: String,

        /// Host contact email
        #[arg(short, long)]
        email: String,

        /// Initial paid period in days (default: 30)
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// List all hosts, soonest-expiring first
    List,
    /// Extend a host's subscription
    Extend {
        /// Host id
        #[arg(short, long)]
        id: String,

        /// Extension length in days
        #[arg(short, long)]
        days: i64,

        /// Optional note recorded in the audit entry
        #[arg(long)]
        note: Option<String>,

        /// Acting admin UID (default: first bootstrap UID)
        #[arg(long)]
        actor: Option<String>,
    },
    /// Suspend a host without touching its subscription end
    Suspend {
        /// Host id
        #[arg(short, long)]
        id: String,

        /// Optional note recorded in the audit entry
        #[arg(long)]
        note: Option<String>,

        /// Acting admin UID (default: first bootstrap UID)
        #[arg(long)]
        actor: Option<String>,
    },
    /// Reactivate a suspended host
    Reactivate {
        /// Host id
        #[arg(short, long)]
        id: String,

        /// Optional note recorded in the audit entry
        #[arg(long)]
        note: Option<String>,

        /// Acting admin UID (default: first bootstrap UID)
        #[arg(long)]
        actor: Option<String>,
    },
    /// Delete a host account (audit history is retained)
    Remove {
        /// Host id
        #[arg(short, long)]
        id: String,

        /// Acting admin UID (default: first bootstrap UID)
        #[arg(long)]
        actor: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Ensure { uid, username } => {
                commands::admin::ensure(&uid, username.as_deref()).await?;
            }
        },
        Commands::Host { action } => match action {
            HostAction::Create {
                uid,
                username,
                email,
                days,
            } => commands::host::create(&uid, &username, &email, days).await?,
            HostAction::List => commands::host::list().await?,
            HostAction::Extend {
                id,
                days,
                note,
                actor,
            } => commands::host::extend(&id, days, note, actor.as_deref()).await?,
            HostAction::Suspend { id, note, actor } => {
                commands::host::suspend(&id, note, actor.as_deref()).await?;
            }
            HostAction::Reactivate { id, note, actor } => {
                commands::host::reactivate(&id, note, actor.as_deref()).await?;
            }
            HostAction::Remove { id, actor } => {
                commands::host::remove(&id, actor.as_deref()).await?;
            }
        },
        Commands::History {
            host,
            query,
            since_days,
        } => commands::history::show(host.as_deref(), query.as_deref(), since_days).await?,
    }
    Ok(())
}
