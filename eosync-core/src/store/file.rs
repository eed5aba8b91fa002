//! State files under `<site>/.eosync/state/event-<id>.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::correspondence::{CorrespondenceMap, OrphanSet};
use crate::error::{CoreError, CoreResult};
use crate::ids::{LocalEventId, OccurrenceId, RemoteId};
use crate::store::CorrespondenceStore;

const STATE_DIR: &str = ".eosync/state";

/// TOML tables need string keys, so links are written as an array.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    orphans: Vec<RemoteId>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Link {
    occurrence: OccurrenceId,
    remote: RemoteId,
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// A store for the site rooted at `site_dir`.
    pub fn new(site_dir: &Path) -> Self {
        FileStore {
            dir: site_dir.join(STATE_DIR),
        }
    }

    fn path(&self, event: LocalEventId) -> PathBuf {
        self.dir.join(format!("event-{event}.toml"))
    }

    fn read(&self, event: LocalEventId) -> CoreResult<StateFile> {
        let path = self.path(event);
        if !path.exists() {
            return Ok(StateFile::default());
        }

        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| CoreError::State(format!("{}: {}", path.display(), e)))
    }

    fn write(&self, event: LocalEventId, state: &StateFile) -> CoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path(event);
        let temp = path.with_extension("toml.tmp");

        let content =
            toml::to_string(state).map_err(|e| CoreError::Serialization(e.to_string()))?;

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }
}

impl CorrespondenceStore for FileStore {
    fn correspondences(&self, event: LocalEventId) -> CoreResult<CorrespondenceMap> {
        let state = self.read(event)?;
        Ok(state
            .links
            .into_iter()
            .map(|l| (l.occurrence, l.remote))
            .collect())
    }

    fn orphans(&self, event: LocalEventId) -> CoreResult<OrphanSet> {
        Ok(self.read(event)?.orphans.into_iter().collect())
    }

    fn store(
        &self,
        event: LocalEventId,
        correspondences: &CorrespondenceMap,
        orphans: Option<&OrphanSet>,
    ) -> CoreResult<()> {
        let orphans = match orphans {
            Some(orphans) => orphans.iter().collect(),
            None => self.read(event)?.orphans,
        };
        let links = correspondences
            .iter()
            .map(|(occurrence, remote)| Link { occurrence, remote })
            .collect();

        self.write(event, &StateFile { orphans, links })
    }

    fn remove(&self, event: LocalEventId) -> CoreResult<()> {
        let path = self.path(event);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn links() -> CorrespondenceMap {
        [
            (OccurrenceId(2), RemoteId(20)),
            (OccurrenceId(1), RemoteId(10)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn unknown_event_has_empty_state() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.correspondences(LocalEventId(1)).unwrap().is_empty());
        assert!(store.orphans(LocalEventId(1)).unwrap().is_empty());
    }

    #[test]
    fn stored_state_reads_back() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let orphans: OrphanSet = [RemoteId(7)].into_iter().collect();

        store
            .store(LocalEventId(3), &links(), Some(&orphans))
            .unwrap();

        assert_eq!(store.correspondences(LocalEventId(3)).unwrap(), links());
        assert_eq!(store.orphans(LocalEventId(3)).unwrap(), orphans);
        assert!(dir.path().join(".eosync/state/event-3.toml").exists());
        assert!(!dir.path().join(".eosync/state/event-3.toml.tmp").exists());
    }

    #[test]
    fn orphans_survive_when_not_given() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let orphans: OrphanSet = [RemoteId(7), RemoteId(8)].into_iter().collect();
        store
            .store(LocalEventId(3), &CorrespondenceMap::new(), Some(&orphans))
            .unwrap();

        store.store(LocalEventId(3), &links(), None).unwrap();

        assert_eq!(store.orphans(LocalEventId(3)).unwrap(), orphans);
        assert_eq!(store.correspondences(LocalEventId(3)).unwrap().len(), 2);
    }

    #[test]
    fn links_are_written_in_occurrence_order() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.store(LocalEventId(1), &links(), None).unwrap();

        let content =
            std::fs::read_to_string(dir.path().join(".eosync/state/event-1.toml")).unwrap();
        let first = content.find("occurrence = 1").unwrap();
        let second = content.find("occurrence = 2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn remove_forgets_event() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.store(LocalEventId(1), &links(), None).unwrap();

        store.remove(LocalEventId(1)).unwrap();
        store.remove(LocalEventId(1)).unwrap();

        assert!(store.correspondences(LocalEventId(1)).unwrap().is_empty());
    }

    #[test]
    fn corrupt_state_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join(".eosync/state")).unwrap();
        std::fs::write(dir.path().join(".eosync/state/event-1.toml"), "links = 3").unwrap();

        assert!(matches!(
            store.correspondences(LocalEventId(1)),
            Err(CoreError::State(_))
        ));
    }
}
