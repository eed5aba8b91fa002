use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RemoteFailure;
use crate::ids::{OccurrenceId, RemoteId};

/// What happened to one CRM record during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Disable,
    Delete,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "+"),
            ActionKind::Update => write!(f, "~"),
            ActionKind::Disable => write!(f, "/"),
            ActionKind::Delete => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordAction {
    pub kind: ActionKind,
    pub remote_id: RemoteId,
    /// The occurrence the record now represents. None for disabled and
    /// deleted records.
    pub occurrence_id: Option<OccurrenceId>,
}

/// Which path a pass took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Counts matched: records were updated in place, pairwise.
    #[default]
    InPlace,
    /// Counts differed: records were fetched and matched by start time.
    Rematch,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::InPlace => write!(f, "in place"),
            Strategy::Rematch => write!(f, "rematch"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub strategy: Strategy,
    pub actions: Vec<RecordAction>,
    pub failures: Vec<RemoteFailure>,
}

impl ReconcileReport {
    pub fn new(strategy: Strategy) -> Self {
        ReconcileReport {
            strategy,
            ..Default::default()
        }
    }

    pub fn record(&mut self, kind: ActionKind, remote_id: RemoteId, occurrence_id: Option<OccurrenceId>) {
        self.actions.push(RecordAction {
            kind,
            remote_id,
            occurrence_id,
        });
    }

    /// Log and keep a failed remote call. The pass carries on with the next item.
    pub fn fail(&mut self, failure: RemoteFailure) {
        tracing::warn!(
            operation = %failure.operation,
            remote_id = ?failure.remote_id.map(|id| id.0),
            occurrence_id = ?failure.occurrence_id.map(|id| id.0),
            payload = ?failure.payload,
            "{}",
            failure.error
        );
        self.failures.push(failure);
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: ReconcileReport) {
        self.actions.extend(other.actions);
        self.failures.extend(other.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Operation, RemoteError};

    #[test]
    fn counts_by_kind() {
        let mut report = ReconcileReport::new(Strategy::Rematch);
        report.record(ActionKind::Update, RemoteId(1), Some(OccurrenceId(1)));
        report.record(ActionKind::Update, RemoteId(2), Some(OccurrenceId(2)));
        report.record(ActionKind::Disable, RemoteId(3), None);

        assert_eq!(report.count(ActionKind::Update), 2);
        assert_eq!(report.count(ActionKind::Disable), 1);
        assert_eq!(report.count(ActionKind::Create), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn failures_are_kept() {
        let mut report = ReconcileReport::default();
        report.fail(
            RemoteFailure::new(Operation::Update, RemoteError::Rejected("bad date".into()))
                .remote(RemoteId(5)),
        );

        assert!(!report.is_clean());
        assert_eq!(report.failures[0].to_string(), "update failed for record 5: bad date");
    }
}
