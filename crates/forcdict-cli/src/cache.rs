use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cache file {path} is not a list of fragments: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("lemma `{lemma}` cannot name a cache file")]
    InvalidLemma { lemma: String },
}

/// Raw article fragments stored per lemma as `<dir>/<lemma>.json`.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The lemma must be a single file name component.
    fn path(&self, lemma: &str) -> Result<PathBuf, CacheError> {
        let unsafe_name = lemma.is_empty()
            || lemma == "."
            || lemma == ".."
            || lemma.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(CacheError::InvalidLemma {
                lemma: lemma.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.json", lemma)))
    }

    /// `None` on a miss.
    pub fn read(&self, lemma: &str) -> Result<Option<Vec<String>>, CacheError> {
        let path = self.path(lemma)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        let fragments =
            serde_json::from_str(&text).map_err(|source| CacheError::Json { path, source })?;
        Ok(Some(fragments))
    }

    /// Empty lists are not stored, so a later lookup tries the network again.
    pub fn save(&self, lemma: &str, fragments: &[String]) -> Result<(), CacheError> {
        if fragments.is_empty() {
            return Ok(());
        }
        let path = self.path(lemma)?;
        let text = serde_json::to_string(fragments).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| CacheError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::{Cache, CacheError};
    use std::fs;

    #[test]
    fn saved_fragments_are_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::open(dir.path().join("nested")).expect("open");
        let fragments = vec!["<div>amo</div>".to_string(), "<div>λόγος</div>".to_string()];
        cache.save("amo", &fragments).expect("save");
        assert_eq!(cache.read("amo").expect("read"), Some(fragments));
    }

    #[test]
    fn missing_lemma_is_a_miss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::open(dir.path()).expect("open");
        assert_eq!(cache.read("nihil").expect("read"), None);
    }

    #[test]
    fn empty_list_is_not_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::open(dir.path()).expect("open");
        cache.save("nihil", &[]).expect("save");
        assert!(!dir.path().join("nihil.json").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::open(dir.path()).expect("open");
        fs::write(cache.dir().join("amo.json"), "{\"not\": \"a list\"}").expect("write");
        assert!(matches!(cache.read("amo"), Err(CacheError::Json { .. })));
    }

    #[test]
    fn lemma_with_path_separator_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Cache::open(dir.path().join("cache")).expect("open");
        let fragments = vec!["<div>x</div>".to_string()];
        for lemma in ["../x", "a/b", "a\\b", "..", ""] {
            assert!(matches!(
                cache.save(lemma, &fragments),
                Err(CacheError::InvalidLemma { .. })
            ));
            assert!(matches!(
                cache.read(lemma),
                Err(CacheError::InvalidLemma { .. })
            ));
        }
        assert!(!dir.path().join("x.json").exists());
        assert_eq!(fs::read_dir(cache.dir()).expect("list").count(), 0);
    }
}
