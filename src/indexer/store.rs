use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::schema::Comic;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to read index from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("unable to decode index at {path}: {source}")]
    Decode { path: PathBuf, source: serde_json::Error },

    #[error("unable to encode comic index: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("unable to flush index to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// The local comic index: every comic fetched so far, keyed by its number, backed by one JSON file.
#[derive(Debug)]
pub struct IndexStore {
    path: PathBuf,
    comics: HashMap<String, Comic>,
}

impl IndexStore {
    /// Creates an empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            comics: HashMap::new(),
        }
    }

    /// Reads and decodes the index file. Both an unreadable and a malformed file are errors.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = File::open(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;

        let comics: HashMap<String, Comic> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StoreError::Decode {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded {} comics from {}", comics.len(), path.display());
        Ok(Self { path, comics })
    }

    /// Like [`IndexStore::load`], but a missing file yields an empty store.
    ///
    /// Permission errors and corrupt content are still reported, so an existing
    /// index is never silently replaced by an empty one.
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        match Self::load(&path) {
            Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("No index found at {}, starting with an empty one.", path.display());
                Ok(Self::new(path))
            }
            other => other,
        }
    }

    /// Serializes the whole index and replaces the backing file.
    ///
    /// The data is written to a sibling temporary file first and renamed over the
    /// target, so a failed write leaves the previous index intact.
    pub fn save(&self) -> Result<(), StoreError> {
        let json_data = serde_json::to_vec(&self.comics)?;

        let tmp_path = self.tmp_path();
        let written = File::create(&tmp_path)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                writer.write_all(&json_data)?;
                writer.flush()
            })
            .and_then(|()| fs::rename(&tmp_path, &self.path));

        if let Err(source) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }

        debug!("Saved {} comics to {}", self.comics.len(), self.path.display());
        Ok(())
    }

    /// Adds a comic unless its number is already indexed. Returns whether it was added.
    pub fn insert(&mut self, comic: Comic) -> bool {
        let key = comic.key();
        if self.comics.contains_key(&key) {
            return false;
        }
        self.comics.insert(key, comic);
        true
    }

    pub fn contains(&self, num: u32) -> bool {
        self.comics.contains_key(&num.to_string())
    }

    #[cfg(test)]
    pub(crate) fn get(&self, num: u32) -> Option<&Comic> {
        self.comics.get(&num.to_string())
    }

    pub fn comics(&self) -> impl Iterator<Item = &Comic> {
        self.comics.values()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &HashMap<String, Comic> {
        &self.comics
    }

    pub fn len(&self) -> usize {
        self.comics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comics.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::schema::sample;
    use tempfile::tempdir;

    #[test]
    fn insert_never_overwrites() {
        let mut store = IndexStore::new("unused.json");
        assert!(store.insert(sample(7, "first")));
        assert!(!store.insert(sample(7, "second")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(7).unwrap().transcript, "first");
        assert!(store.contains(7));
        assert!(!store.contains(8));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut store = IndexStore::new(&path);
        store.insert(sample(1, "a cat sat"));
        let mut with_news = sample(2, "a dog ran");
        with_news.news = Some("<b>news</b>".to_string());
        store.insert(with_news);
        store.save().unwrap();

        let loaded = IndexStore::load(&path).unwrap();
        assert_eq!(loaded.entries(), store.entries());
        assert_eq!(loaded.path(), path.as_path());
        assert!(!dir.path().join("index.json.tmp").exists());
    }

    #[test]
    fn persisted_format_is_an_object_keyed_by_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut store = IndexStore::new(&path);
        store.insert(sample(42, "towel"));
        store.save().unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["42"]["num"], 42);
        assert_eq!(raw["42"]["safe_title"], "Comic 42");
    }

    #[test]
    fn load_missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let err = IndexStore::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn open_or_create_starts_empty_when_missing() {
        let dir = tempdir().unwrap();
        let store = IndexStore::open_or_create(dir.path().join("nope.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, "{not json").unwrap();

        let err = IndexStore::open_or_create(&path).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        // A non-empty directory at the target makes the final rename fail.
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut store = IndexStore::new(&path);
        store.insert(sample(1, "a cat sat"));
        let err = store.save().unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!dir.path().join("index.json.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("missing").join("index.json"));
        let err = store.save().unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
