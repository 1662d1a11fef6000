use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use super::loader::{load_file, LoadError};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Process-wide load-once cache
// ---------------------------------------------------------------------------

/// Source files are treated as static for the life of the process, so
/// entries are never invalidated. Failed loads are not cached.
static CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<Dataset>>>> = OnceLock::new();

fn cache_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Load `path` once and hand out the shared, read-only dataset afterwards.
pub fn load_cached(path: &Path) -> Result<Arc<Dataset>, LoadError> {
    let key = cache_key(path);
    let cache = CACHE.get_or_init(Default::default);

    if let Some(ds) = cache
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get(&key)
    {
        log::debug!("Dataset cache hit for {}", key.display());
        return Ok(Arc::clone(ds));
    }

    let dataset = Arc::new(load_file(path)?);
    log::info!(
        "Loaded {} records ({} countries, {} meat types, {} value categories) from {}",
        dataset.len(),
        dataset.countries.len(),
        dataset.meat_types.len(),
        dataset.value_categories.len(),
        key.display()
    );

    let mut guard = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(Arc::clone(guard.entry(key).or_insert(dataset)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn second_load_returns_the_same_dataset() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Country,Meat Type,Value Category,Value").unwrap();
        writeln!(file, "2020-01-01,Italy,Poultry,Production,42").unwrap();
        file.flush().unwrap();

        let first = load_cached(file.path()).unwrap();
        // Rewriting the file must not be observed: the first load is served.
        writeln!(file, "2020-02-01,Italy,Poultry,Production,43").unwrap();
        file.flush().unwrap();
        let second = load_cached(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");

        assert!(load_cached(&path).is_err());

        std::fs::write(
            &path,
            "Date,Country,Meat Type,Value Category,Value\n2020-01-01,Italy,Beef,Import,7\n",
        )
        .unwrap();
        let ds = load_cached(&path).unwrap();
        assert_eq!(ds.len(), 1);
    }
}
