//! In-memory lookup of a cassette's positive entries.

use crate::cassette;
use cassette_core::error::Result;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;
use std::io::Read;
use std::path::Path;

/// Content of every positive entry, keyed by `"/" + name`.
///
/// Negative entries are dropped while loading. When two entries share a
/// name the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackIndex {
    tracks: BTreeMap<String, Vec<u8>>,
}

impl TrackIndex {
    /// Load the cassette at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut index = Self::default();
        cassette::read_cassette(path, |entry| {
            index.insert(entry);
            Ok(())
        })?;
        log::debug!("Indexed {} tracks from {}", index.len(), path.display());
        Ok(index)
    }

    /// Load a cassette from any reader.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        let mut index = Self::default();
        cassette::read_cassette_from(source, |entry| {
            index.insert(entry);
            Ok(())
        })?;
        Ok(index)
    }

    fn insert(&mut self, entry: cassette_core::Entry) {
        if entry.negative {
            log::trace!("Skipping negative entry {}", entry.name);
            return;
        }

        let key = format!("/{}", entry.name);
        let content = entry.into_content().unwrap_or_default();
        match self.tracks.entry(key) {
            MapEntry::Occupied(mut slot) => {
                log::warn!("Duplicate entry {}, keeping the later one", slot.key());
                slot.insert(content);
            }
            MapEntry::Vacant(slot) => {
                slot.insert(content);
            }
        }
    }

    /// Content stored under `key` (for example `"/textures/stone.png"`).
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.tracks.get(key).map(Vec::as_slice)
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Keys in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// Take the underlying map.
    pub fn into_map(self) -> BTreeMap<String, Vec<u8>> {
        self.tracks
    }
}
