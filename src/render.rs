//! TUI rendering traits for eosync types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to eosync-core types using owo_colors.

use eosync_core::correspondence::{CorrespondenceMap, OrphanSet};
use eosync_core::error::RemoteFailure;
use eosync_core::local::LocalEvent;
use eosync_core::location::Venue;
use eosync_core::sync::{
    ActionKind, MatchResult, Preview, ReconcileReport, RecordAction, UnmatchedPolicy,
};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        let symbol = self.to_string();
        match self {
            ActionKind::Create => symbol.green().to_string(),
            ActionKind::Update => symbol.yellow().to_string(),
            ActionKind::Disable => symbol.magenta().to_string(),
            ActionKind::Delete => symbol.red().to_string(),
        }
    }
}

impl Render for RecordAction {
    fn render(&self) -> String {
        let target = match self.occurrence_id {
            Some(occurrence) => format!("record {} (occurrence {})", self.remote_id, occurrence),
            None => format!("record {}", self.remote_id),
        };
        format!("{} {}", self.kind.render(), target)
    }
}

impl Render for RemoteFailure {
    fn render(&self) -> String {
        format!("{} {}", "!".red(), self.to_string().red())
    }
}

impl Render for LocalEvent {
    fn render(&self) -> String {
        format!("📅 {} {}", self.id.dimmed(), self.title)
    }
}

impl Render for Venue {
    fn render(&self) -> String {
        format!("📍 {} {}", self.id.dimmed(), self.name)
    }
}

/// Threshold for compact view (show counts instead of individual records)
const COMPACT_THRESHOLD: usize = 8;

impl Render for ReconcileReport {
    fn render(&self) -> String {
        let mut lines = vec![format!("   {}", format!("({})", self.strategy).dimmed())];

        if self.actions.is_empty() && self.failures.is_empty() {
            lines.push(format!("   {}", "No changes".dimmed()));
        } else if self.actions.len() <= COMPACT_THRESHOLD {
            lines.extend(self.actions.iter().map(|a| format!("   {}", a.render())));
        } else {
            lines.push(format!("   {}", render_counts(self)));
        }

        lines.extend(self.failures.iter().map(|f| format!("   {}", f.render())));
        lines.join("\n")
    }
}

/// One-line summary of a report's actions, e.g. `2 created, 1 disabled`.
pub fn render_counts(report: &ReconcileReport) -> String {
    let parts: Vec<String> = [
        (ActionKind::Create, "created"),
        (ActionKind::Update, "updated"),
        (ActionKind::Disable, "disabled"),
        (ActionKind::Delete, "deleted"),
    ]
    .into_iter()
    .filter_map(|(kind, label)| {
        let count = report.count(kind);
        (count > 0).then(|| format!("{} {}", count, label))
    })
    .collect();

    if parts.is_empty() {
        "nothing changed".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn render_stored(correspondences: &CorrespondenceMap, orphans: &OrphanSet) -> String {
    if correspondences.is_empty() && orphans.is_empty() {
        return format!("   {}", "Never synced".dimmed());
    }

    let mut lines: Vec<String> = correspondences
        .iter()
        .map(|(occurrence, remote)| {
            format!("   occurrence {} {} record {}", occurrence, "→".dimmed(), remote)
        })
        .collect();

    if !orphans.is_empty() {
        let ids: Vec<String> = orphans.iter().map(|id| id.to_string()).collect();
        lines.push(format!("   {} {}", "orphaned:".dimmed(), ids.join(", ")));
    }

    lines.join("\n")
}

pub fn render_preview(preview: &Preview, policy: UnmatchedPolicy) -> String {
    let MatchResult {
        matched,
        unmatched_local,
        unmatched_remote,
        unorphaned,
    } = &preview.matches;

    let mut lines = vec![format!("   {}", format!("({})", preview.strategy).dimmed())];

    for (occurrence, remote) in matched {
        let symbol = if unorphaned.contains(remote) {
            "↺".cyan().to_string()
        } else {
            ActionKind::Update.render()
        };
        lines.push(format!(
            "   {} occurrence {} {} record {}",
            symbol,
            occurrence,
            "→".dimmed(),
            remote
        ));
    }
    for occurrence in unmatched_local {
        lines.push(format!(
            "   {} occurrence {} {}",
            ActionKind::Create.render(),
            occurrence.id,
            occurrence.start.to_string().dimmed()
        ));
    }
    let unused = match policy {
        UnmatchedPolicy::Disable => ActionKind::Disable,
        UnmatchedPolicy::Delete => ActionKind::Delete,
    };
    for remote in unmatched_remote {
        lines.push(format!("   {} record {}", unused.render(), remote));
    }
    lines.extend(preview.failures.iter().map(|f| format!("   {}", f.render())));

    lines.join("\n")
}
