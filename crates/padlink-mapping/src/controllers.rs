use ahash::AHashMap;
use padlink_guid::{variants, ControllerIdentity, SdlVersion};

use crate::database::MappingDatabase;
use crate::record::ControllerMapping;
use crate::source::{ControllerDatabaseSource, LiveSnapshot};

/// A controller the SDL library sees, with its mapping resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEntry {
    pub index: usize,
    pub name: String,
    pub path: String,
    pub identity: ControllerIdentity,
    pub mapping: Option<ControllerMapping>,
}

/// The live device table plus the offline mapping dataset.
///
/// Live entries are reachable by `(index, identity)`, which tells apart
/// identical controllers, by bare identity and by device path. Every SDL
/// version layout of an identity is registered, so callers holding any of
/// them reach the same entry.
#[derive(Debug, Clone, Default)]
pub struct ControllerDatabase {
    entries: Vec<DatabaseEntry>,
    by_index: AHashMap<(usize, ControllerIdentity), usize>,
    by_identity: AHashMap<ControllerIdentity, usize>,
    by_path: AHashMap<String, usize>,
    offline: MappingDatabase,
    version: SdlVersion,
}

impl ControllerDatabase {
    /// Loads the live table from `source`. A failing source leaves the
    /// table empty; `offline` still answers identity lookups.
    pub fn load(source: &dyn ControllerDatabaseSource, offline: MappingDatabase) -> Self {
        let snapshot = match source.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("controller database source {} failed: {e}", source.name());
                LiveSnapshot::default()
            }
        };
        Self::from_snapshot(snapshot, offline)
    }

    pub fn from_snapshot(snapshot: LiveSnapshot, offline: MappingDatabase) -> Self {
        let mut db = Self {
            offline,
            version: snapshot.version,
            ..Self::default()
        };
        for live in snapshot.controllers {
            let mapping = match live.mapping.as_deref().map(ControllerMapping::parse) {
                Some(Ok(mapping)) => Some(mapping),
                Some(Err(e)) => {
                    log::warn!("invalid mapping for {}: {e}", live.name);
                    None
                }
                None => None,
            }
            .or_else(|| db.offline.lookup(&live.identity, &live.name).cloned());

            db.push(DatabaseEntry {
                index: live.index,
                name: live.name,
                path: live.path,
                identity: live.identity,
                mapping,
            });
        }
        log::debug!(
            "controller database: {} live entries (SDL {}), {} offline mappings",
            db.entries.len(),
            snapshot.version,
            db.offline.len()
        );
        db
    }

    fn push(&mut self, entry: DatabaseEntry) {
        let position = self.entries.len();
        for identity in variants(&entry.identity, &entry.name, None) {
            self.by_index.entry((entry.index, identity.clone())).or_insert(position);
            self.by_identity.entry(identity).or_insert(position);
        }
        if !entry.path.is_empty() {
            self.by_path.entry(entry.path.to_ascii_lowercase()).or_insert(position);
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    /// Identity layout of the live entries.
    pub fn version(&self) -> SdlVersion {
        self.version
    }

    pub fn offline(&self) -> &MappingDatabase {
        &self.offline
    }

    pub fn find(&self, index: usize, identity: &ControllerIdentity) -> Option<&DatabaseEntry> {
        self.by_index
            .get(&(index, identity.clone()))
            .map(|&position| &self.entries[position])
    }

    pub fn find_by_identity(&self, identity: &ControllerIdentity) -> Option<&DatabaseEntry> {
        self.by_identity.get(identity).map(|&position| &self.entries[position])
    }

    pub fn find_by_path(&self, path: &str) -> Option<&DatabaseEntry> {
        self.by_path
            .get(&path.to_ascii_lowercase())
            .map(|&position| &self.entries[position])
    }

    /// Mapping for a device: the live entry at `index`, any live entry with
    /// the identity, then the offline dataset.
    pub fn mapping_for(
        &self,
        index: Option<usize>,
        identity: &ControllerIdentity,
        name: &str,
    ) -> Option<&ControllerMapping> {
        index
            .and_then(|index| self.find(index, identity))
            .or_else(|| self.find_by_identity(identity))
            .and_then(|entry| entry.mapping.as_ref())
            .or_else(|| self.offline.lookup(identity, name))
    }
}
