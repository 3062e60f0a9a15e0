use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use confsplit_types::{validate_collection_name, validate_document_name, ConfigValue};
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::traits::{Storage, DEFAULT_COLLECTION};

/// File-backed document storage.
///
/// Each document is one pretty-printed JSON file, `<name>.json`, inside the
/// collection's directory. The default collection lives in the base
/// directory itself; collection `a.b` lives in subdirectory `a/b`. Names
/// are validated before any path is built, so documents can never escape
/// the base directory.
pub struct DirectoryStorage {
    base: PathBuf,
    collection: String,
}

impl DirectoryStorage {
    /// Open (or create) a storage rooted at `base`, bound to the default
    /// collection.
    pub fn new(base: impl Into<PathBuf>) -> StoreResult<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self {
            base,
            collection: DEFAULT_COLLECTION.to_string(),
        })
    }

    /// Base directory holding every collection.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn collection_dir(&self) -> PathBuf {
        let mut dir = self.base.clone();
        if !self.collection.is_empty() {
            for part in self.collection.split('.') {
                dir.push(part);
            }
        }
        dir
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.collection_dir().join(format!("{name}.json"))
    }
}

impl Storage for DirectoryStorage {
    fn read(&self, name: &str) -> StoreResult<Option<ConfigValue>> {
        validate_document_name(name)?;
        let text = match fs::read_to_string(self.document_path(name)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = serde_json::from_str(&text).map_err(|err| StoreError::Decode {
            document: name.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Some(value))
    }

    fn write(&self, name: &str, value: &ConfigValue) -> StoreResult<()> {
        validate_document_name(name)?;
        let text = serde_json::to_string_pretty(value)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        fs::create_dir_all(self.collection_dir())?;
        fs::write(self.document_path(name), text)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        validate_document_name(name)?;
        match fs::remove_file(self.document_path(name)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn list_all(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = self.collection_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "unreadable directory entry; skipping");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                warn!(path = %path.display(), "non-UTF-8 document file name; skipping");
                continue;
            };
            if name.starts_with(prefix) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn create_collection(&self, name: &str) -> StoreResult<Arc<dyn Storage>> {
        if name != DEFAULT_COLLECTION {
            validate_collection_name(name)?;
        }
        Ok(Arc::new(Self {
            base: self.base.clone(),
            collection: name.to_string(),
        }))
    }

    fn collection_names(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        collect_collections(&self.base, "", &mut names)?;
        names.sort();
        Ok(names)
    }
}

/// Recursively collect dotted collection names under `dir`.
///
/// A directory becomes a collection name when it directly contains at
/// least one document file; empty intermediate directories are traversed
/// but not listed.
fn collect_collections(dir: &Path, base: &str, out: &mut Vec<String>) -> StoreResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "unreadable directory entry; skipping");
                continue;
            }
        };
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Ok(segment) = entry.file_name().into_string() else {
            warn!(path = %entry.path().display(), "non-UTF-8 collection directory; skipping");
            continue;
        };
        let name = if base.is_empty() {
            segment
        } else {
            format!("{base}.{segment}")
        };
        let path = entry.path();
        if contains_documents(&path)? {
            out.push(name.clone());
        }
        collect_collections(&path, &name, out)?;
    }
    Ok(())
}

fn contains_documents(dir: &Path) -> StoreResult<bool> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            return Ok(true);
        }
    }
    Ok(false)
}

impl std::fmt::Debug for DirectoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStorage")
            .field("base", &self.base)
            .field("collection", &self.collection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsplit_types::Mapping;

    fn demo_value(n: i64) -> ConfigValue {
        let mut mapping = Mapping::new();
        mapping.insert("n", ConfigValue::from(n));
        ConfigValue::Mapping(mapping)
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();

        store.write("system.site", &demo_value(1)).unwrap();
        assert!(dir.path().join("system.site.json").is_file());

        let read_back = store.read("system.site").unwrap().expect("should exist");
        assert_eq!(read_back, demo_value(1));
    }

    #[test]
    fn read_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();
        assert!(store.read("missing").unwrap().is_none());
    }

    #[test]
    fn delete_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();

        store.write("doc", &demo_value(1)).unwrap();
        assert!(store.delete("doc").unwrap());
        assert!(!dir.path().join("doc.json").exists());
        assert!(!store.delete("doc").unwrap());
    }

    #[test]
    fn values_persist_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DirectoryStorage::new(dir.path()).unwrap();
            store.write("doc", &demo_value(9)).unwrap();
        }
        let reopened = DirectoryStorage::new(dir.path()).unwrap();
        assert_eq!(reopened.read("doc").unwrap(), Some(demo_value(9)));
    }

    #[test]
    fn list_all_is_sorted_and_prefix_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();
        store.write("views.view.b", &demo_value(1)).unwrap();
        store.write("views.view.a", &demo_value(2)).unwrap();
        store.write("system.site", &demo_value(3)).unwrap();

        assert_eq!(
            store.list_all("").unwrap(),
            vec!["system.site", "views.view.a", "views.view.b"]
        );
        assert_eq!(
            store.list_all("views.").unwrap(),
            vec!["views.view.a", "views.view.b"]
        );
    }

    // -----------------------------------------------------------------------
    // Collections
    // -----------------------------------------------------------------------

    #[test]
    fn collections_map_to_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();

        let nested = store.create_collection("split.graft").unwrap();
        nested.write("doc", &demo_value(1)).unwrap();

        assert!(dir.path().join("split").join("graft").join("doc.json").is_file());
        assert_eq!(nested.read("doc").unwrap(), Some(demo_value(1)));
        // Invisible from the default collection.
        assert!(store.read("doc").unwrap().is_none());
    }

    #[test]
    fn collection_names_list_nonempty_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();

        store.write("root.doc", &demo_value(0)).unwrap();
        let a = store.create_collection("split.a").unwrap();
        a.write("doc", &demo_value(1)).unwrap();
        let deep = store.create_collection("split.a.inner").unwrap();
        deep.write("doc", &demo_value(2)).unwrap();

        // "split" itself holds no documents, only subdirectories.
        assert_eq!(
            store.collection_names().unwrap(),
            vec!["split.a", "split.a.inner"]
        );
    }

    #[test]
    fn binding_a_collection_creates_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();

        let bound = store.create_collection("staged").unwrap();
        assert!(!dir.path().join("staged").exists());
        assert!(store.collection_names().unwrap().is_empty());

        bound.write("doc", &demo_value(1)).unwrap();
        assert_eq!(store.collection_names().unwrap(), vec!["staged"]);
    }

    // -----------------------------------------------------------------------
    // Decode failures and name validation
    // -----------------------------------------------------------------------

    #[test]
    fn corrupt_files_surface_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        match store.read("broken") {
            Err(StoreError::Decode { document, .. }) => assert_eq!(document, "broken"),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_names_never_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();

        assert!(store.write("../escape", &demo_value(1)).is_err());
        assert!(store.read("has space").is_err());
        assert!(store.create_collection("a..b").is_err());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn non_json_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStorage::new(dir.path()).unwrap();
        store.write("doc", &demo_value(1)).unwrap();
        fs::write(dir.path().join("README.txt"), "notes").unwrap();

        assert_eq!(store.list_all("").unwrap(), vec!["doc"]);
    }
}
