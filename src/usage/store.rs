//! Usage data persistence
//!
//! Key/value stores for usage snapshots with change notification.
//! Subscribers are invoked after every successful write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Callback invoked with the new value after a key changes
pub type Subscriber = Box<dyn Fn(&str) + Send + Sync>;

/// String key/value store with change notification
pub trait Store: Send + Sync {
    /// Get the current value for a key
    fn get(&self, key: &str) -> Option<String>;

    /// Set a key and notify subscribers
    fn set(&self, key: &str, value: String);

    /// Register a callback for changes to a key
    fn subscribe(&self, key: &str, subscriber: Subscriber);
}

/// In-memory store, data is lost on restart
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    subscribers: Mutex<HashMap<String, Vec<Subscriber>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Callbacks run with the subscriber list locked; they must not
    // call back into the store.
    fn notify(subscribers: &Mutex<HashMap<String, Vec<Subscriber>>>, key: &str, value: &str) {
        if let Ok(subscribers) = subscribers.lock() {
            if let Some(list) = subscribers.get(key) {
                for subscriber in list {
                    subscriber(value);
                }
            }
        }
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entries.read() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => None,
        }
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.clone());
        }
        Self::notify(&self.subscribers, key, &value);
    }

    fn subscribe(&self, key: &str, subscriber: Subscriber) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.entry(key.to_string()).or_default().push(subscriber);
        }
    }
}

/// File-backed store
///
/// Keeps the full key/value map in memory and rewrites the backing JSON
/// file on every set. Write failures are logged and swallowed so a full
/// disk never fails a request.
pub struct FileStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
    subscribers: Mutex<HashMap<String, Vec<Subscriber>>>,
}

impl FileStore {
    /// Open a store at the given path, loading any existing data
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = Self::load(&path);
        debug!("📁 Opened usage store at {:?} ({} keys)", path, cache.len());

        Self {
            path,
            cache: RwLock::new(cache),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Default store location under the platform data directory
    pub fn default_path() -> PathBuf {
        match dirs::data_dir() {
            Some(dir) => dir.join("aiproxyhub").join("usage.json"),
            None => PathBuf::from("aiproxyhub-usage.json"),
        }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            // Missing file is the normal first-run state
            Err(_) => return HashMap::new(),
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                warn!("Failed to parse usage store at {:?}: {}", path, e);
                HashMap::new()
            }
        }
    }

    fn persist(&self, cache: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("Failed to create usage store directory {:?}: {}", parent, e);
                    return;
                }
            }
        }

        let content = match serde_json::to_string_pretty(cache) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to serialize usage store: {}", e);
                return;
            }
        };

        if let Err(e) = std::fs::write(&self.path, content) {
            warn!("Failed to write usage store at {:?}: {}", self.path, e);
        }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.cache.read() {
            Ok(cache) => cache.get(key).cloned(),
            Err(_) => None,
        }
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key.to_string(), value.clone());
            self.persist(&cache);
        }
        MemoryStore::notify(&self.subscribers, key, &value);
    }

    fn subscribe(&self, key: &str, subscriber: Subscriber) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.entry(key.to_string()).or_default().push(subscriber);
        }
    }
}
