use std::collections::HashMap;
use std::sync::RwLock;

use crate::{Error, Result, Substrate};

/// Process-local substrate backed by a `HashMap`.
///
/// Values live only as long as the process. Used for tests and for embedding the
/// store where nothing needs to survive a restart.
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    data: RwLock<HashMap<String, String>>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a substrate pre-populated with raw values.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| Error::Internal("substrate lock poisoned".to_string()))?;
        let mut keys: Vec<String> = data.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl Substrate for MemorySubstrate {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|_| Error::Internal("substrate lock poisoned".to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| Error::Internal("substrate lock poisoned".to_string()))?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
