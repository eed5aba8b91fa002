//! Error types for the eosync ecosystem.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{LocalEventId, OccurrenceId, RemoteId, VenueId};

/// Errors that halt an operation before (or instead of) touching remote records.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote system unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("No event type available for event {0}: define one on the event, set default_event_type, or create event types in the CRM")]
    NoEventType(LocalEventId),

    #[error("Event not found: {0}")]
    EventNotFound(LocalEventId),

    #[error("Venue not found: {0}")]
    VenueNotFound(VenueId),

    #[error("Invalid schedule for event {event}: {message}")]
    Schedule { event: LocalEventId, message: String },

    #[error("State file error: {0}")]
    State(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No remote configured")]
    NoRemoteConfigured,
}

/// Result type alias for eosync operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error reported by a remote backend for a single call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// The backing system could not be reached or initialized.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The backing system rejected the call (API-level `is_error`).
    #[error("{0}")]
    Rejected(String),

    /// The requested record does not exist.
    #[error("record {0} not found")]
    NotFound(RemoteId),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// The remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Fetch,
    Link,
    Create,
    Update,
    Disable,
    Delete,
    EnableRegistration,
    SaveEmail,
    SavePhone,
    SaveAddress,
    SaveLocation,
    DeleteLocation,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Fetch => "fetch",
            Operation::Link => "link",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Disable => "disable",
            Operation::Delete => "delete",
            Operation::EnableRegistration => "enable registration",
            Operation::SaveEmail => "save email",
            Operation::SavePhone => "save phone",
            Operation::SaveAddress => "save address",
            Operation::SaveLocation => "save location",
            Operation::DeleteLocation => "delete location",
        };
        f.write_str(name)
    }
}

/// A failed remote call with enough context to diagnose it.
///
/// Every remote-call wrapper returns this instead of logging in place, so the
/// caller decides how to surface it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFailure {
    pub operation: Operation,
    pub remote_id: Option<RemoteId>,
    pub occurrence_id: Option<OccurrenceId>,
    /// The payload that was sent, if any.
    pub payload: Option<serde_json::Value>,
    pub error: RemoteError,
}

impl RemoteFailure {
    pub fn new(operation: Operation, error: RemoteError) -> Self {
        RemoteFailure {
            operation,
            remote_id: None,
            occurrence_id: None,
            payload: None,
            error,
        }
    }

    pub fn remote(mut self, id: RemoteId) -> Self {
        self.remote_id = Some(id);
        self
    }

    pub fn occurrence(mut self, id: OccurrenceId) -> Self {
        self.occurrence_id = Some(id);
        self
    }

    pub fn payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload = serde_json::to_value(payload).ok();
        self
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", self.operation)?;
        match (self.remote_id, self.occurrence_id) {
            (Some(r), Some(o)) => write!(f, " for record {r} (occurrence {o})")?,
            (Some(r), None) => write!(f, " for record {r}")?,
            (None, Some(o)) => write!(f, " for occurrence {o}")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.error)
    }
}

impl std::error::Error for RemoteFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
