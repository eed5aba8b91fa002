use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use eosync_core::config::Settings;
use eosync_core::ids::VenueId;
use eosync_core::location::{LocationReconciler, Venue};

use crate::render::Render;

pub async fn run(settings: &Settings, id: VenueId, delete: bool) -> Result<()> {
    let site = settings.site();
    let venue = site.venue(id)?;
    let remote = settings.remote()?;
    let reconciler = LocationReconciler::connect(&remote).await?;

    println!("{}", venue.render());

    if delete {
        if reconciler.delete_venue_location(&venue).await? {
            site.save_venue(&Venue {
                civi_id: None,
                ..venue.clone()
            })?;
            println!("   {} location {}", "-".red(), venue.civi_id.unwrap_or_default());
        } else {
            println!("   {}", "No location to delete".dimmed());
        }
        return Ok(());
    }

    let location = reconciler
        .sync_venue(&venue)
        .await
        .with_context(|| format!("Failed to sync venue {}", venue.id))?;

    let symbol = if venue.civi_id == Some(location.id) {
        "~".yellow().to_string()
    } else {
        "+".green().to_string()
    };

    if venue.civi_id != Some(location.id) {
        site.save_venue(&Venue {
            civi_id: Some(location.id),
            ..venue
        })?;
    }

    println!("   {} location {}", symbol, location.id);
    Ok(())
}
