//! Building cassettes from directory trees.

use crate::archive::PendingEntry;
use crate::cassette;
use crate::filter::PathFilter;
use cassette_core::error::Result;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collects files from directories and writes them as a cassette.
///
/// Files from [`add_directory`](Self::add_directory) are written before
/// files from [`add_negative_directory`](Self::add_negative_directory),
/// each group in the order it was added. Adding the same file under the
/// same name twice only records it once.
///
/// ```rust,no_run
/// use cassette_archive::{CassetteBuilder, PathFilter};
///
/// let mut builder = CassetteBuilder::new();
/// builder.add_directory("assets", Some(PathFilter::include("**/*.png")?))?;
/// builder.add_negative_directory("extras", None)?;
/// builder.write("assets.wav")?;
/// # Ok::<(), cassette_core::CassetteError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CassetteBuilder {
    positive: Vec<(String, PathBuf)>,
    negative: Vec<(String, PathBuf)>,
    seen: HashSet<(bool, String, PathBuf)>,
}

impl CassetteBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files collected.
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    /// Whether no files have been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add every regular file under `directory` that passes `filter`.
    pub fn add_directory(
        &mut self,
        directory: impl AsRef<Path>,
        filter: Option<PathFilter>,
    ) -> Result<&mut Self> {
        self.add(directory.as_ref(), filter.as_ref(), false)?;
        Ok(self)
    }

    /// Like [`add_directory`](Self::add_directory), marking the files
    /// negative.
    pub fn add_negative_directory(
        &mut self,
        directory: impl AsRef<Path>,
        filter: Option<PathFilter>,
    ) -> Result<&mut Self> {
        self.add(directory.as_ref(), filter.as_ref(), true)?;
        Ok(self)
    }

    fn add(&mut self, directory: &Path, filter: Option<&PathFilter>, negative: bool) -> Result<()> {
        let mut added = 0usize;

        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.path().is_file() {
                continue;
            }

            let name = relative_name(directory, entry.path());
            if filter.is_some_and(|filter| !filter.matches(&name)) {
                log::trace!("Filtered out {}", name);
                continue;
            }

            let path = entry.into_path();
            if !self.seen.insert((negative, name.clone(), path.clone())) {
                continue;
            }
            if negative {
                self.negative.push((name, path));
            } else {
                self.positive.push((name, path));
            }
            added += 1;
        }

        match filter {
            Some(filter) => log::debug!(
                "Added {} files from {} ({})",
                added,
                directory.display(),
                filter
            ),
            None => log::debug!("Added {} files from {}", added, directory.display()),
        }
        Ok(())
    }

    /// Entries in write order.
    pub fn entries(&self) -> Vec<PendingEntry> {
        let positive = self
            .positive
            .iter()
            .map(|(name, path)| PendingEntry::file(name.clone(), path.clone()));
        let negative = self
            .negative
            .iter()
            .map(|(name, path)| PendingEntry::file(name.clone(), path.clone()).with_negative(true));
        positive.chain(negative).collect()
    }

    /// Write the collected files as a WAVE cassette, returning the frame
    /// count.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<u64> {
        cassette::write_cassette(path, &self.entries())
    }
}

/// `/` separated path of `path` relative to `directory`.
fn relative_name(directory: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(directory).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("textures/block")).unwrap();
        fs::write(dir.path().join("textures/block/stone.png"), b"png").unwrap();
        fs::write(dir.path().join("textures/block/stone.json"), b"{}").unwrap();
        fs::write(dir.path().join("pack.mcmeta"), b"meta").unwrap();
        dir
    }

    fn names(builder: &CassetteBuilder) -> Vec<(String, bool)> {
        builder
            .entries()
            .into_iter()
            .map(|entry| (entry.name, entry.negative))
            .collect()
    }

    #[test]
    fn test_walks_sorted_relative_names() {
        let dir = tree();
        let mut builder = CassetteBuilder::new();
        builder.add_directory(dir.path(), None).unwrap();
        assert_eq!(
            names(&builder),
            vec![
                ("pack.mcmeta".to_string(), false),
                ("textures/block/stone.json".to_string(), false),
                ("textures/block/stone.png".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_filter_applies_to_relative_path() {
        let dir = tree();
        let mut builder = CassetteBuilder::new();
        builder
            .add_directory(dir.path(), Some(PathFilter::include("textures/**").unwrap()))
            .unwrap();
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_negatives_come_last() {
        let dir = tree();
        let other = tempfile::tempdir().unwrap();
        fs::write(other.path().join("a.txt"), b"a").unwrap();

        let mut builder = CassetteBuilder::new();
        builder
            .add_negative_directory(other.path(), None)
            .unwrap()
            .add_directory(dir.path(), Some(PathFilter::include("*.mcmeta").unwrap()))
            .unwrap();
        assert_eq!(
            names(&builder),
            vec![
                ("pack.mcmeta".to_string(), false),
                ("a.txt".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_same_file_added_once() {
        let dir = tree();
        let mut builder = CassetteBuilder::new();
        builder.add_directory(dir.path(), None).unwrap();
        builder.add_directory(dir.path(), None).unwrap();
        assert_eq!(builder.len(), 3);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = CassetteBuilder::new();
        assert!(builder.add_directory(dir.path().join("missing"), None).is_err());
        assert!(builder.is_empty());
    }
}
