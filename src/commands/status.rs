use anyhow::Result;
use owo_colors::OwoColorize;

use eosync_core::config::Settings;
use eosync_core::ids::LocalEventId;
use eosync_core::local::OccurrenceSource;
use eosync_core::store::CorrespondenceStore;
use eosync_core::sync::Reconciler;

use crate::render::{Render, render_preview, render_stored};

pub async fn run(settings: &Settings, event: Option<LocalEventId>, remote: bool) -> Result<()> {
    let site = settings.site();
    let events = match event {
        Some(id) => vec![site.event(id)?],
        None => site.events()?,
    };

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let store = site.store();
    let remote = if remote { Some(settings.remote()?) } else { None };
    let reconciler = match &remote {
        Some(remote) => Some(Reconciler::connect(remote).await?),
        None => None,
    };

    for (i, event) in events.iter().enumerate() {
        println!("{}", event.render());

        let correspondences = store.correspondences(event.id)?;
        let orphans = store.orphans(event.id)?;

        match &reconciler {
            Some(reconciler) => {
                let occurrences = site.occurrences(event.id)?;
                let preview = reconciler
                    .preview(&occurrences, &correspondences, &orphans)
                    .await;
                println!("{}", render_preview(&preview, settings.policy()));
            }
            None => println!("{}", render_stored(&correspondences, &orphans)),
        }

        if !event.sync {
            println!("   {}", "sync = false".dimmed());
        }

        // Add spacing between events (but not after the last one)
        if i < events.len() - 1 {
            println!();
        }
    }

    Ok(())
}
