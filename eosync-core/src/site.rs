//! The site directory: local events, venues and sync state.
//!
//! ```text
//! <site>/events/<id>.toml
//! <site>/venues/<id>.toml
//! <site>/.eosync/state/event-<id>.toml
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};
use crate::event::Occurrence;
use crate::ids::{LocalEventId, VenueId};
use crate::local::{LocalEvent, OccurrenceSource};
use crate::location::Venue;
use crate::store::FileStore;

#[derive(Debug, Clone)]
pub struct Site {
    dir: PathBuf,
}

impl Site {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Site { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.dir)
    }

    fn event_path(&self, id: LocalEventId) -> PathBuf {
        self.dir.join("events").join(format!("{id}.toml"))
    }

    fn venue_path(&self, id: VenueId) -> PathBuf {
        self.dir.join("venues").join(format!("{id}.toml"))
    }

    /// Every event, ordered by id.
    pub fn events(&self) -> CoreResult<Vec<LocalEvent>> {
        let mut events: Vec<LocalEvent> = read_all(&self.dir.join("events"))?;
        events.sort_by_key(|e| e.id);
        Ok(events)
    }

    pub fn event(&self, id: LocalEventId) -> CoreResult<LocalEvent> {
        let path = self.event_path(id);
        if !path.exists() {
            return Err(CoreError::EventNotFound(id));
        }
        read_toml(&path)
    }

    pub fn save_event(&self, event: &LocalEvent) -> CoreResult<()> {
        write_toml(&self.event_path(event.id), event)
    }

    /// Every venue, ordered by id.
    pub fn venues(&self) -> CoreResult<Vec<Venue>> {
        let mut venues: Vec<Venue> = read_all(&self.dir.join("venues"))?;
        venues.sort_by_key(|v| v.id);
        Ok(venues)
    }

    pub fn venue(&self, id: VenueId) -> CoreResult<Venue> {
        let path = self.venue_path(id);
        if !path.exists() {
            return Err(CoreError::VenueNotFound(id));
        }
        read_toml(&path)
    }

    pub fn save_venue(&self, venue: &Venue) -> CoreResult<()> {
        write_toml(&self.venue_path(venue.id), venue)
    }
}

impl OccurrenceSource for Site {
    fn occurrences(&self, event: LocalEventId) -> CoreResult<Vec<Occurrence>> {
        Ok(self.event(event)?.chronological())
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| CoreError::Serialization(format!("{}: {}", path.display(), e)))
}

fn read_all<T: DeserializeOwned>(dir: &Path) -> CoreResult<Vec<T>> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(Vec::new());
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .map(|path| read_toml(&path))
        .collect()
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content =
        toml::to_string_pretty(value).map_err(|e| CoreError::Serialization(e.to_string()))?;
    let temp = path.with_extension("toml.tmp");

    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
