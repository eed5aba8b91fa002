use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use eosync_core::config::Settings;
use eosync_core::ids::LocalEventId;
use eosync_core::sync::{ReconcileReport, Reconciler, SyncOptions, UnmatchedPolicy};

use crate::render::{Render, render_counts};

pub async fn run(
    settings: &Settings,
    ids: Vec<LocalEventId>,
    all: bool,
    delete_unused: bool,
) -> Result<()> {
    let site = settings.site();
    let events = if all {
        site.events()?
    } else {
        ids.into_iter()
            .map(|id| site.event(id))
            .collect::<Result<Vec<_>, _>>()?
    };

    if events.is_empty() {
        println!("{}", "No events to sync".dimmed());
        return Ok(());
    }

    tracing::debug!(count = events.len(), site = %site.dir().display(), "Syncing events");

    let remote = settings.remote()?;
    let reconciler = Reconciler::connect(&remote).await?;
    let store = site.store();
    let defaults = settings.record_defaults();
    let policy = if delete_unused {
        UnmatchedPolicy::Delete
    } else {
        settings.policy()
    };

    let mut totals = ReconcileReport::default();

    for (i, event) in events.iter().enumerate() {
        println!("{}", event.render());

        let venue = event.venue.map(|id| site.venue(id)).transpose()?;
        let options = SyncOptions {
            policy,
            skip: !event.sync,
        };

        let result = reconciler
            .sync_event(&store, &site, event, venue.as_ref(), &defaults, options)
            .await
            .with_context(|| format!("Failed to sync event {}", event.id))?;

        match result {
            Some(reconciliation) => {
                println!("{}", reconciliation.report.render());
                totals.merge(reconciliation.report);
            }
            None => println!("   {}", "Skipped (sync = false)".dimmed()),
        }

        // Add spacing between events (but not after the last one)
        if i < events.len() - 1 {
            println!();
        }
    }

    println!("\nSynced: {}", render_counts(&totals));

    if !totals.is_clean() {
        anyhow::bail!("{} remote calls failed", totals.failures.len());
    }

    Ok(())
}
