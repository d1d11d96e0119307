use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache i/o failed on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode cache value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to produce cache value: {0}")]
    Produce(#[source] anyhow::Error),
}

#[derive(Clone, Debug, Default)]
pub struct CacheOptions {
    /// The cache is regenerated unless it was modified after all of these files.
    pub must_be_newer_than: Vec<PathBuf>,

    /// Remove every other cache in the directory before writing a new one.
    pub delete_others_on_write: bool,
}

/// Location of the cache for `token` inside `dir`.
pub fn cache_path(dir: &Path, token: &str) -> PathBuf {
    dir.join(format!("{token}.json"))
}

/// Reads `<dir>/<token>.json`, regenerating it with `produce` if it is missing,
/// stale or cannot be decoded.
pub fn read_cache<T, F>(
    dir: impl AsRef<Path>,
    token: &str,
    options: &CacheOptions,
    produce: F,
) -> Result<T, CacheError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> anyhow::Result<T>,
{
    let dir = dir.as_ref();
    let path = cache_path(dir, token);

    if let Some(value) = read_fresh(dir, &path, options)? {
        debug!("cache hit: {}", path.display());
        return Ok(value);
    }

    debug!("cache miss: {}", path.display());
    let value = produce().map_err(CacheError::Produce)?;

    let encoded = serde_json::to_vec(&value)?;

    if options.delete_others_on_write {
        delete_caches(dir)?;
    }

    fs::write(&path, encoded).map_err(io_error(&path))?;

    Ok(value)
}

fn read_fresh<T: DeserializeOwned>(dir: &Path, path: &Path, options: &CacheOptions) -> Result<Option<T>, CacheError> {
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
        return Ok(None);
    }

    let modified = match fs::metadata(path) {
        Ok(metadata) => metadata.modified().map_err(io_error(path))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(path)(err)),
    };

    if let Some(newest) = newest_modification(&options.must_be_newer_than)? {
        if modified <= newest {
            debug!("cache {} is older than its dependencies", path.display());
            return Ok(None);
        }
    }

    let bytes = fs::read(path).map_err(io_error(path))?;

    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!("discarding unreadable cache {}: {err}", path.display());
            Ok(None)
        }
    }
}

fn newest_modification(paths: &[PathBuf]) -> Result<Option<SystemTime>, CacheError> {
    let mut newest = None;

    for path in paths {
        let modified = fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .map_err(io_error(path))?;

        newest = newest.max(Some(modified));
    }

    Ok(newest)
}

fn delete_caches(dir: &Path) -> Result<(), CacheError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            debug!("removing cache {}", path.display());
            fs::remove_file(&path).map_err(io_error(&path))?;
        }
    }

    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::fs::File;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::*;

    fn counting<'a>(calls: &'a Cell<usize>, value: Value) -> impl FnOnce() -> anyhow::Result<Value> + 'a {
        move || {
            calls.set(calls.get() + 1);
            Ok(value)
        }
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
    }

    #[test]
    fn writes_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Cell::new(0);
        let options = CacheOptions::default();

        let first: Value = read_cache(dir.path(), "items", &options, counting(&calls, json!({"a": 1}))).unwrap();
        let second: Value = read_cache(dir.path(), "items", &options, counting(&calls, json!({"a": 2}))).unwrap();

        assert_eq!(first, json!({"a": 1}));
        assert_eq!(second, json!({"a": 1}));
        assert_eq!(calls.get(), 1);

        let stored = fs::read_to_string(dir.path().join("items.json")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&stored).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let value: Vec<String> = read_cache(&nested, "t", &CacheOptions::default(), || Ok(vec!["x".into()])).unwrap();

        assert_eq!(value, vec!["x"]);
        assert!(nested.join("t.json").is_file());
    }

    #[test]
    fn corrupt_cache_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("items.json"), "{not json").unwrap();
        let calls = Cell::new(0);

        let value: Value = read_cache(dir.path(), "items", &CacheOptions::default(), counting(&calls, json!([1]))).unwrap();

        assert_eq!(value, json!([1]));
        assert_eq!(calls.get(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("items.json")).unwrap(), "[1]");
    }

    #[test]
    fn mismatched_type_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("n.json"), r#""text""#).unwrap();

        let value: u32 = read_cache(dir.path(), "n", &CacheOptions::default(), || Ok(7)).unwrap();

        assert_eq!(value, 7);
    }

    #[test]
    fn stale_cache_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        fs::write(&source, "data").unwrap();
        let cache_dir = dir.path().join("cache");
        let options = CacheOptions {
            must_be_newer_than: vec![source.clone()],
            ..CacheOptions::default()
        };
        let calls = Cell::new(0);

        set_mtime(&source, SystemTime::now() - Duration::from_secs(3600));
        let _: Value = read_cache(&cache_dir, "t", &options, counting(&calls, json!(1))).unwrap();
        let fresh: Value = read_cache(&cache_dir, "t", &options, counting(&calls, json!(2))).unwrap();
        assert_eq!(fresh, json!(1));
        assert_eq!(calls.get(), 1);

        set_mtime(&source, SystemTime::now() + Duration::from_secs(3600));
        let regenerated: Value = read_cache(&cache_dir, "t", &options, counting(&calls, json!(3))).unwrap();
        assert_eq!(regenerated, json!(3));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn missing_dependency_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.json"), "1").unwrap();
        let options = CacheOptions {
            must_be_newer_than: vec![dir.path().join("missing.txt")],
            ..CacheOptions::default()
        };

        let err = read_cache::<Value, _>(dir.path(), "t", &options, || Ok(json!(2))).unwrap_err();

        assert!(matches!(err, CacheError::Io { path, .. } if path.ends_with("missing.txt")));
    }

    #[test]
    fn deletes_other_caches_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.json"), "1").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let _: Value = read_cache(dir.path(), "a", &CacheOptions::default(), || Ok(json!("a"))).unwrap();
        assert!(dir.path().join("old.json").exists());

        let options = CacheOptions {
            delete_others_on_write: true,
            ..CacheOptions::default()
        };
        let _: Value = read_cache(dir.path(), "b", &options, || Ok(json!("b"))).unwrap();

        assert!(!dir.path().join("old.json").exists());
        assert!(!dir.path().join("a.json").exists());
        assert!(dir.path().join("b.json").is_file());
        assert!(dir.path().join("notes.txt").is_file());
    }

    #[test]
    fn encode_failure_keeps_other_caches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.json"), "1").unwrap();
        let options = CacheOptions {
            delete_others_on_write: true,
            ..CacheOptions::default()
        };

        // json object keys must be strings
        let err = read_cache::<HashMap<(u8, u8), u8>, _>(dir.path(), "t", &options, || {
            Ok(HashMap::from([((1, 2), 3)]))
        })
        .unwrap_err();

        assert!(matches!(err, CacheError::Encode(_)));
        assert!(dir.path().join("old.json").is_file());
        assert!(!dir.path().join("t.json").exists());
    }

    #[test]
    fn producer_errors_surface() {
        let dir = tempfile::tempdir().unwrap();

        let err = read_cache::<Value, _>(dir.path(), "t", &CacheOptions::default(), || anyhow::bail!("offline")).unwrap_err();

        assert!(matches!(err, CacheError::Produce(_)));
        assert!(!dir.path().join("t.json").exists());
    }
}
