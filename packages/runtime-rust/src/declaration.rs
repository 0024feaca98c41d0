//! Module declarations stored as JSON documents.

use std::path::{Path, PathBuf};

use anyhow::Context;
use stormod_core::StorageModuleConfig;

use crate::traits::ModuleDeclaration;

/// Declaration read from a JSON file each time it is invoked.
///
/// The document has the shape `{"collections": {...}, "operations": {...}}`.
/// Reading happens inside [`ModuleDeclaration::declare`], so a missing or
/// malformed file surfaces on first access to the module, not at construction.
#[derive(Debug, Clone)]
pub struct JsonDeclaration {
    path: PathBuf,
}

impl JsonDeclaration {
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses a declaration document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid module declaration.
    pub fn parse(text: &str) -> anyhow::Result<StorageModuleConfig> {
        serde_json::from_str(text).context("invalid module declaration")
    }
}

impl ModuleDeclaration for JsonDeclaration {
    fn declare(&self) -> anyhow::Result<StorageModuleConfig> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", self.path.display()))
    }
}
