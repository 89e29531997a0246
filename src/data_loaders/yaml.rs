// ~/src/data_loaders/yaml.rs

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{LazyLock, RwLock},
    time::{Duration, Instant},
};

use serde::{de::DeserializeOwned, Serialize};
use serde_yaml::Value;

use crate::error::{Error, Result};

/* =========================
   CONFIG CACHE
========================= */

// Per-file cache for YAML data
static YAML_CACHE: LazyLock<RwLock<HashMap<String, (Value, Instant)>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));
const CACHE_TTL: Duration = Duration::from_secs(1);
const CACHE_CAPACITY: usize = 16;

fn cache_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// YAML loader with a short-lived per-file cache. Returns `None` when the file
/// is missing or does not parse.
pub fn load_yaml(path: &Path) -> Option<Value> {
    let now = Instant::now();
    let key = cache_key(path);
    if let Ok(cache) = YAML_CACHE.read() {
        if let Some((v, t)) = cache.get(&key) {
            if now.duration_since(*t) < CACHE_TTL {
                return Some(v.clone());
            }
        }
    }

    let txt = fs::read_to_string(path).ok()?;
    let v: Value = serde_yaml::from_str(&txt).ok()?;

    if let Ok(mut cache) = YAML_CACHE.write() {
        // Evict the oldest entry once full
        if cache.len() >= CACHE_CAPACITY {
            if let Some(oldest_key) = cache
                .iter()
                .min_by_key(|(_, (_, t))| t)
                .map(|(k, _)| k.clone())
            {
                cache.remove(&oldest_key);
            }
        }
        cache.insert(key, (v.clone(), now));
    }

    Some(v)
}

/// Uncached typed read. Scalars land in the field types `T` asks for, so a
/// `String` field keeps `1e5` as written.
pub fn load_yaml_as<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let txt = fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&txt).ok()
}

/// Serializes `data` and rewrites `path`, dropping any cached copy of it.
pub fn save_yaml<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let txt = serde_yaml::to_string(data).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    if let Ok(mut cache) = YAML_CACHE.write() {
        cache.remove(&cache_key(path));
    }

    fs::write(path, txt).map_err(|e| Error::io(path, e))
}
