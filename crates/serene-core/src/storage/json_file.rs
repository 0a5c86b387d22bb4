//! File-per-key JSON backend.

use std::path::{Path, PathBuf};

use super::backend::KvBackend;
use crate::error::StorageError;

/// Stores each key as `<dir>/<key>.json`, with the key percent-encoded.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl KvBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonFileBackend::new(dir.path()).unwrap();
        assert_eq!(kv.dir(), dir.path());
        assert!(kv.get("breathing_sessions").unwrap().is_none());

        kv.set("breathing_sessions", "[1,2]").unwrap();
        assert_eq!(kv.get("breathing_sessions").unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("breathing_sessions.json").exists());
        assert!(!dir.path().join("breathing_sessions.json.tmp").exists());
    }

    #[test]
    fn remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonFileBackend::new(dir.path()).unwrap();
        kv.remove("nothing").unwrap();
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonFileBackend::new(dir.path()).unwrap();
        kv.set("../escape", "x").unwrap();
        assert!(dir.path().join("..%2Fescape.json").exists());
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }

    #[test]
    fn similar_keys_use_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let kv = JsonFileBackend::new(dir.path()).unwrap();
        kv.set("a.b", "dot").unwrap();
        kv.set("a_b", "underscore").unwrap();
        kv.set("a/b", "slash").unwrap();

        assert_eq!(kv.get("a.b").unwrap().as_deref(), Some("dot"));
        assert_eq!(kv.get("a_b").unwrap().as_deref(), Some("underscore"));
        assert_eq!(kv.get("a/b").unwrap().as_deref(), Some("slash"));
        kv.remove("a.b").unwrap();
        assert_eq!(kv.get("a_b").unwrap().as_deref(), Some("underscore"));
    }
}
