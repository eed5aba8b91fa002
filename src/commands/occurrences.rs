use anyhow::Result;
use chrono::NaiveDateTime;
use owo_colors::OwoColorize;

use eosync_core::config::Settings;
use eosync_core::ids::LocalEventId;
use eosync_core::local::LocalEvent;
use eosync_core::recurrence::expand_schedule;

use crate::render::Render;

pub fn run(
    settings: &Settings,
    id: LocalEventId,
    until: Option<NaiveDateTime>,
    write: bool,
) -> Result<()> {
    let site = settings.site();
    let event = site.event(id)?;

    let Some(schedule) = &event.schedule else {
        anyhow::bail!("Event {} has no [schedule] to expand", id);
    };

    let occurrences = expand_schedule(id, schedule, &event.occurrences, until)?;

    println!("{}", event.render());
    for occurrence in &occurrences {
        let marker = if event.occurrences.iter().any(|o| o.id == occurrence.id) {
            " ".to_string()
        } else {
            "+".green().to_string()
        };
        println!(
            "   {} {} {} {}",
            marker,
            occurrence.id.dimmed(),
            occurrence.start,
            format!("→ {}", occurrence.end).dimmed()
        );
    }

    let removed: Vec<_> = event
        .occurrences
        .iter()
        .filter(|o| !occurrences.iter().any(|n| n.id == o.id))
        .collect();
    for occurrence in &removed {
        println!(
            "   {} {} {}",
            "-".red(),
            occurrence.id.dimmed(),
            occurrence.start.to_string().red()
        );
    }

    if write {
        let count = occurrences.len();
        site.save_event(&LocalEvent {
            occurrences,
            ..event
        })?;
        println!("\nSaved {} occurrences", count);
    } else if !removed.is_empty() || occurrences.len() != event.occurrences.len() {
        println!("\n{}", "Run with --write to save".dimmed());
    }

    Ok(())
}
