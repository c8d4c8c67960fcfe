use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Error, Result, Substrate};

/// On-disk [`Substrate`] keeping one `.json` file per key.
///
/// Writes use an atomic "write-then-rename" strategy so a crash mid-write never
/// leaves a half-written collection behind.
#[derive(Debug, Clone)]
pub struct FileSubstrate {
    data_dir: PathBuf,
}

impl FileSubstrate {
    /// Initializes a new `FileSubstrate` in the specified directory.
    ///
    /// If the directory does not exist, it will be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { data_dir: dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
        {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }
}

impl Substrate for FileSubstrate {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the value to `<key>.json.tmp` first and then renames it over the
    /// final file.
    fn write(&self, key: &str, value: &str) -> Result<()> {
        let file_path = self.file_path(key)?;
        let temp_path = file_path.with_extension("json.tmp");

        fs::write(&temp_path, value.as_bytes())?;
        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let substrate = FileSubstrate::new(dir.path()).unwrap();

        substrate.write("army_products", "[]").unwrap();

        assert_eq!(substrate.read("army_products").unwrap().as_deref(), Some("[]"));
        assert_eq!(substrate.read("other").unwrap(), None);
    }

    #[test]
    fn test_atomic_rename() {
        let dir = tempdir().unwrap();
        let substrate = FileSubstrate::new(dir.path()).unwrap();

        substrate.write("army_products", "[{\"id\":\"1\"}]").unwrap();

        let file_path = dir.path().join("army_products.json");
        assert!(file_path.exists());

        let temp_path = dir.path().join("army_products.json.tmp");
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        FileSubstrate::new(dir.path())
            .unwrap()
            .write("army_products", "[1]")
            .unwrap();

        let reopened = FileSubstrate::new(dir.path()).unwrap();
        assert_eq!(reopened.read("army_products").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        FileSubstrate::new(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let substrate = FileSubstrate::new(dir.path()).unwrap();

        assert!(matches!(substrate.read("../escape"), Err(Error::InvalidKey(_))));
        assert!(matches!(substrate.write("a/b", "[]"), Err(Error::InvalidKey(_))));
        assert!(matches!(substrate.write("", "[]"), Err(Error::InvalidKey(_))));
    }
}
