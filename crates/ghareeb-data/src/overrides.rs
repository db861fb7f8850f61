use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use ghareeb_types::MeaningLookup;

use crate::{DataError, LoadMode, load_file};

/// User-supplied meanings that shadow the curated ones, keyed by `uniqueKey`.
#[derive(Clone, Debug, Default)]
pub struct MeaningOverrides {
    meanings: HashMap<String, String>,
}

impl MeaningOverrides {
    /// Load a JSON object mapping `uniqueKey` to meaning text.
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, DataError> {
        let buffer = load_file(path.as_ref(), mode)?;
        let meanings: HashMap<String, String> =
            serde_json::from_slice(buffer.as_slice()).map_err(|source| DataError::Json {
                what: "meaning overrides",
                source,
            })?;
        info!("loaded {} meaning overrides", meanings.len());
        Ok(Self { meanings })
    }

    /// Like [`MeaningOverrides::load`], but a missing file yields `None`.
    pub fn load_optional(path: impl AsRef<Path>, mode: LoadMode) -> Result<Option<Self>, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path, mode).map(Some)
    }

    pub fn insert(&mut self, unique_key: impl Into<String>, meaning: impl Into<String>) {
        self.meanings.insert(unique_key.into(), meaning.into());
    }

    pub fn len(&self) -> usize {
        self.meanings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meanings.is_empty()
    }
}

impl MeaningLookup for MeaningOverrides {
    fn meaning_for(&self, unique_key: &str) -> Option<&str> {
        self.meanings.get(unique_key).map(String::as_str)
    }
}
