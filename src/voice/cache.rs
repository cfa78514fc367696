//! Local audio byte cache
//!
//! Synthesized speech is stored under a directory with an `index.json`
//! mapping each key to the file holding its bytes. File names are the
//! SHA-256 of the key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Name of the index file inside the cache directory
pub const INDEX_FILE_NAME: &str = "index.json";

/// Everything that determines a piece of synthesized audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioKey {
    pub voice: String,
    /// Sample rate in Hz (e.g. 16000)
    pub rate: u32,
    pub channels: u16,
    /// Bits per sample (e.g. 16)
    pub bits: u16,
    pub text: String,
}

impl AudioKey {
    /// Index key: fields joined with tabs, text last
    #[must_use]
    pub fn index_key(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}",
            self.voice, self.rate, self.channels, self.bits, self.text
        )
    }

    fn file_name(&self) -> String {
        hex::encode(Sha256::digest(self.index_key().as_bytes()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    audio_bytes_file_name: String,
}

/// Directory-backed key/value store for audio bytes
#[derive(Debug)]
pub struct AudioCache {
    dir: PathBuf,
    index: BTreeMap<String, IndexEntry>,
}

impl AudioCache {
    /// Open (or create) a cache directory
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or the index is corrupt
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let index_path = dir.join(INDEX_FILE_NAME);
        let index = if index_path.exists() {
            let content = std::fs::read_to_string(&index_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::Cache(format!("corrupt index {}: {e}", index_path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(dir = %dir.display(), entries = index.len(), "opened audio cache");
        Ok(Self { dir, index })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Fetch cached bytes
    ///
    /// An index entry whose file has disappeared is dropped.
    ///
    /// # Errors
    ///
    /// Returns error on IO failure
    pub fn get(&mut self, key: &AudioKey) -> Result<Option<Vec<u8>>> {
        let index_key = key.index_key();
        let Some(entry) = self.index.get(&index_key) else {
            return Ok(None);
        };

        let path = self.dir.join(&entry.audio_bytes_file_name);
        if path.exists() {
            return Ok(Some(std::fs::read(&path)?));
        }

        tracing::warn!(path = %path.display(), "cached audio file missing, dropping entry");
        self.index.remove(&index_key);
        self.write_index()?;
        Ok(None)
    }

    /// Store bytes, replacing any previous audio for the key
    ///
    /// # Errors
    ///
    /// Returns error on IO failure
    pub fn put(&mut self, key: &AudioKey, audio: &[u8]) -> Result<()> {
        let index_key = key.index_key();
        let (file_name, is_new) = match self.index.get(&index_key) {
            Some(entry) => (entry.audio_bytes_file_name.clone(), false),
            None => (key.file_name(), true),
        };

        std::fs::write(self.dir.join(&file_name), audio)?;

        if is_new {
            self.index.insert(
                index_key,
                IndexEntry {
                    audio_bytes_file_name: file_name,
                },
            );
            self.write_index()?;
        }
        Ok(())
    }

    fn write_index(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.index)?;
        std::fs::write(self.dir.join(INDEX_FILE_NAME), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> AudioKey {
        AudioKey {
            voice: "alloy".into(),
            rate: 16_000,
            channels: 1,
            bits: 16,
            text: text.into(),
        }
    }

    #[test]
    fn index_key_layout() {
        assert_eq!(key("hi").index_key(), "alloy\t16000\t1\t16\thi");
    }

    #[test]
    fn put_then_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = AudioCache::open(dir.path()).unwrap();
        assert_eq!(cache.get(&key("hello")).unwrap(), None);

        cache.put(&key("hello"), b"RIFF1234").unwrap();
        assert_eq!(cache.get(&key("hello")).unwrap().as_deref(), Some(&b"RIFF1234"[..]));

        let mut reopened = AudioCache::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.get(&key("hello")).unwrap().as_deref(),
            Some(&b"RIFF1234"[..])
        );
        assert_eq!(reopened.get(&key("other")).unwrap(), None);
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = AudioCache::open(dir.path()).unwrap();
        cache.put(&key("a"), b"one").unwrap();
        cache.put(&key("a"), b"two").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")).unwrap().as_deref(), Some(&b"two"[..]));
    }

    #[test]
    fn missing_file_drops_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = AudioCache::open(dir.path()).unwrap();
        cache.put(&key("gone"), b"bytes").unwrap();

        std::fs::remove_file(dir.path().join(key("gone").file_name())).unwrap();
        assert_eq!(cache.get(&key("gone")).unwrap(), None);
        assert!(cache.is_empty());

        let reopened = AudioCache::open(dir.path()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn corrupt_index_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), "{not json").unwrap();
        assert!(matches!(AudioCache::open(dir.path()), Err(Error::Cache(_))));
    }
}
