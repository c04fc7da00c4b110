//! ZenSync CLI
//!
//! Runs Zendesk sync batches against a file store.
//!
//! # Commands
//!
//! - `channel` - Register and list Zendesk channels
//! - `import` - Import users, tickets and comments from Zendesk
//! - `export` - Export local records to Zendesk and run follow-up jobs
//! - `apply-cases` - Push CRM case edits onto their tickets
//! - `jobs` - List or run queued follow-up jobs
//! - `status` - Show per-channel sync counts

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zensync_engine::EntityKind;

/// Zendesk to CRM sync.
#[derive(Parser)]
#[command(name = "zensync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configured channels
    Channel {
        #[command(subcommand)]
        action: ChannelAction,
    },

    /// Import records from Zendesk
    Import {
        /// Channel id
        #[arg(short, long)]
        channel: u64,

        /// Entity kind (user, ticket, ticket_comment); all kinds if omitted
        #[arg(short, long)]
        kind: Option<EntityKind>,
    },

    /// Export local records to Zendesk
    Export {
        /// Channel id
        #[arg(short, long)]
        channel: u64,

        /// Entity kind (user, ticket, ticket_comment)
        #[arg(short, long, default_value = "ticket")]
        kind: EntityKind,

        /// Local ids to export; every pending record if omitted
        #[arg(short, long, value_delimiter = ',')]
        ids: Vec<u64>,

        /// Leave follow-up jobs queued for `jobs run`
        #[arg(long)]
        no_jobs: bool,
    },

    /// Apply edited CRM cases to their tickets and export them
    ApplyCases {
        /// Channel id
        #[arg(short, long)]
        channel: u64,

        /// Case ids
        #[arg(value_delimiter = ',', required = true)]
        cases: Vec<u64>,

        /// Only mark tickets for export
        #[arg(long)]
        no_export: bool,
    },

    /// Manage queued follow-up jobs
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Show sync counts per channel
    Status {
        /// Restrict to one channel
        #[arg(short, long)]
        channel: Option<u64>,

        /// Locale of status labels
        #[arg(short, long, default_value = "en")]
        locale: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ChannelAction {
    /// Register or replace channels from a JSON file
    Add {
        /// File holding one channel object or an array of them
        file: PathBuf,
    },

    /// List registered channels
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum JobsAction {
    /// List queued jobs
    List {
        /// Restrict to one channel
        #[arg(short, long)]
        channel: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run the queued jobs of a channel
    Run {
        /// Channel id
        #[arg(short, long)]
        channel: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Channel { action } => {
            let path = cli.store.ok_or("Store path required for channel")?;
            match action {
                ChannelAction::Add { file } => commands::channel::add(&path, &file)?,
                ChannelAction::List { format } => commands::channel::list(&path, &format)?,
            }
        }
        Commands::Import { channel, kind } => {
            let path = cli.store.ok_or("Store path required for import")?;
            commands::import::run(&path, channel, kind)?;
        }
        Commands::Export {
            channel,
            kind,
            ids,
            no_jobs,
        } => {
            let path = cli.store.ok_or("Store path required for export")?;
            commands::export::run(&path, channel, kind, &ids, !no_jobs)?;
        }
        Commands::ApplyCases {
            channel,
            cases,
            no_export,
        } => {
            let path = cli.store.ok_or("Store path required for apply-cases")?;
            commands::apply_cases::run(&path, channel, &cases, !no_export)?;
        }
        Commands::Jobs { action } => {
            let path = cli.store.ok_or("Store path required for jobs")?;
            match action {
                JobsAction::List { channel, format } => {
                    commands::jobs::list(&path, channel, &format)?;
                }
                JobsAction::Run { channel } => commands::jobs::run(&path, channel)?,
            }
        }
        Commands::Status {
            channel,
            locale,
            format,
        } => {
            let path = cli.store.ok_or("Store path required for status")?;
            commands::status::run(&path, channel, &locale, &format)?;
        }
        Commands::Version => {
            println!("ZenSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
