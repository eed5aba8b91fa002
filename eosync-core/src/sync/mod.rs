//! Occurrence matching and reconciliation.

mod matcher;
mod reconciler;
mod report;

pub use matcher::{MatchResult, match_occurrences};
pub use reconciler::{Preview, Reconciler, Reconciliation, SyncOptions, UnmatchedPolicy};
pub use report::{ActionKind, ReconcileReport, RecordAction, Strategy};
