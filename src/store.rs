//! Key-value persistence for scripts and automation tracks.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{automation::AutomationTrack, error::StoreError, model::Script};

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal persistence surface the engine relies on.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&mut self, key: &str, value: String) -> StoreResult<()>;

    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Percent-encodes `key` into a file name inside the store directory, so
    /// any non-empty key maps to exactly one file and never to a path.
    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", urlencoding::encode(key))))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: String) -> StoreResult<()> {
        let path = self.path_for(key)?;
        fs::write(&path, value).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> StoreResult<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Codec {
            key: key.to_string(),
            source,
        })
}

fn set_json<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Codec {
        key: key.to_string(),
        source,
    })?;
    store.set(key, raw)
}

pub fn track_key(script_id: &str) -> String {
    format!("automation:{script_id}")
}

pub fn script_key(script_id: &str) -> String {
    format!("script:{script_id}")
}

/// Automation tracks keyed by script id.
pub struct TrackStore {
    inner: Box<dyn KeyValueStore>,
}

impl TrackStore {
    pub fn new(inner: Box<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    pub fn load(&self, script_id: &str) -> StoreResult<Option<AutomationTrack>> {
        get_json(self.inner.as_ref(), &track_key(script_id))
    }

    pub fn save(&mut self, script_id: &str, track: &AutomationTrack) -> StoreResult<()> {
        set_json(self.inner.as_mut(), &track_key(script_id), track)?;
        tracing::info!(script_id, keyframes = track.len(), "automation track saved");
        Ok(())
    }

    pub fn delete(&mut self, script_id: &str) -> StoreResult<()> {
        self.inner.remove(&track_key(script_id))
    }
}

/// Saved scripts keyed by id.
pub struct ScriptStore {
    inner: Box<dyn KeyValueStore>,
}

impl ScriptStore {
    pub fn new(inner: Box<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub fn load(&self, script_id: &str) -> StoreResult<Option<Script>> {
        get_json(self.inner.as_ref(), &script_key(script_id))
    }

    pub fn save(&mut self, script: &Script) -> StoreResult<()> {
        set_json(self.inner.as_mut(), &script_key(&script.id), script)
    }

    pub fn delete(&mut self, script_id: &str) -> StoreResult<()> {
        self.inner.remove(&script_key(script_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::Keyframe;

    #[test]
    fn track_roundtrips_through_memory_store() {
        let mut store = TrackStore::in_memory();
        assert!(store.load("s1").unwrap().is_none());

        let track =
            AutomationTrack::from_keyframes([Keyframe::new(0.0, 0.0), Keyframe::new(10.0, 5.0)]);
        store.save("s1", &track).unwrap();
        assert_eq!(store.load("s1").unwrap(), Some(track));

        store.delete("s1").unwrap();
        assert!(store.load("s1").unwrap().is_none());
    }

    #[test]
    fn corrupt_value_is_a_codec_error() {
        let mut mem = MemoryStore::new();
        mem.set(&track_key("bad"), "not json".to_string()).unwrap();
        let store = TrackStore::new(Box::new(mem));
        assert!(matches!(
            store.load("bad"),
            Err(StoreError::Codec { .. })
        ));
    }

    #[test]
    fn file_store_keeps_keys_inside_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));

        store.set("../escape", "1".to_string()).unwrap();
        assert!(dir.path().join("..%2Fescape.json").exists());
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
        assert_eq!(store.get("../escape").unwrap().as_deref(), Some("1"));
    }
}
