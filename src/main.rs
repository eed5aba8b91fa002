mod commands;
mod render;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use eosync_core::config::Settings;
use eosync_core::ids::{LocalEventId, VenueId};

#[derive(Parser)]
#[command(name = "eosync")]
#[command(about = "Keep recurring local events in sync with CiviCRM event records")]
struct Cli {
    /// Log debug output (overridden by EOSYNC_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push events' occurrences to the CRM
    Sync {
        /// Events to sync (by id)
        #[arg(required_unless_present = "all")]
        events: Vec<LocalEventId>,

        /// Sync every event in the site
        #[arg(long, conflicts_with = "events")]
        all: bool,

        /// Delete records no occurrence uses instead of disabling them
        #[arg(long)]
        delete_unused: bool,
    },
    /// Show stored correspondences and orphans
    Status {
        /// Only show this event
        event: Option<LocalEventId>,

        /// Fetch records from the CRM and show how they would match
        #[arg(long)]
        remote: bool,
    },
    /// Sync a venue's CRM location
    Venue {
        venue: VenueId,

        /// Delete the venue's location instead
        #[arg(long)]
        delete: bool,
    },
    /// Regenerate an event's occurrences from its schedule
    Occurrences {
        event: LocalEventId,

        /// Stop at this date/time (e.g., "2025-12-31T23:59:59")
        #[arg(long)]
        until: Option<NaiveDateTime>,

        /// Save the regenerated occurrences to the event file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let settings = Settings::load()?;

    match cli.command {
        Commands::Sync {
            events,
            all,
            delete_unused,
        } => commands::sync::run(&settings, events, all, delete_unused).await,
        Commands::Status { event, remote } => commands::status::run(&settings, event, remote).await,
        Commands::Venue { venue, delete } => commands::venue::run(&settings, venue, delete).await,
        Commands::Occurrences {
            event,
            until,
            write,
        } => commands::occurrences::run(&settings, event, until, write),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("EOSYNC_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
