//! JSON document loading and saving

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, NormalizedPath, Result, io};

const FORMAT: &str = "JSON";

/// JSON document store.
///
/// Reads and writes serde types as pretty-printed JSON (two-space
/// indentation). Saving goes through [`io::write_atomic`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonStore;

impl JsonStore {
    /// Create a new JsonStore.
    pub fn new() -> Self {
        Self
    }

    /// Load a value from a JSON file.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Parse JSON text that was read from `path`.
    pub fn parse<T: DeserializeOwned>(&self, path: &NormalizedPath, content: &str) -> Result<T> {
        serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            path: path.to_native(),
            format: FORMAT.into(),
            message: e.to_string(),
        })
    }

    /// Render a value as the text [`JsonStore::save`] would write.
    pub fn render<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).map_err(|e| Error::ConfigSerialize {
            path: path.to_native(),
            format: FORMAT.into(),
            message: e.to_string(),
        })
    }

    /// Save a value to a JSON file.
    ///
    /// Uses atomic write to prevent corruption.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let mut content = self.render(path, value)?;
        content.push('\n');
        io::write_text(path, &content)
    }
}
