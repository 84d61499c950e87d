//! On-disk layout of the data root.
//!
//! ```text
//! <root>/template.index.json
//! <root>/table.index.json
//! <root>/table/<name>.json
//! <root>/application/<name>.json
//! ```

use std::path::{Path, PathBuf};

use crate::error::StoreError;

const TEMPLATE_INDEX_FILE: &str = "template.index.json";
const TABLE_INDEX_FILE: &str = "table.index.json";
const TABLE_DIR: &str = "table";
const APPLICATION_DIR: &str = "application";
const DOCUMENT_EXT: &str = "json";

/// A read-only reference document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StaticDocument {
    TemplateIndex,
    TableIndex,
    Table(String),
}

/// Resolves document paths under a data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn application_dir(&self) -> PathBuf {
        self.root.join(APPLICATION_DIR)
    }

    pub fn table_dir(&self) -> PathBuf {
        self.root.join(TABLE_DIR)
    }

    /// Path of an application file. The name must already be validated.
    pub fn application_path(&self, name: &str) -> PathBuf {
        self.application_dir()
            .join(format!("{}.{}", name, DOCUMENT_EXT))
    }

    /// Resolve a static document, validating table names.
    pub fn static_path(&self, doc: &StaticDocument) -> Result<PathBuf, StoreError> {
        match doc {
            StaticDocument::TemplateIndex => Ok(self.root.join(TEMPLATE_INDEX_FILE)),
            StaticDocument::TableIndex => Ok(self.root.join(TABLE_INDEX_FILE)),
            StaticDocument::Table(name) => {
                validate_name(name)?;
                Ok(self.table_dir().join(format!("{}.{}", name, DOCUMENT_EXT)))
            }
        }
    }
}

/// Check that a name can be used as a file identifier inside its directory.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is a relative path component")
    } else if name.contains(['/', '\\', '\0']) {
        Some("name contains a path separator")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
