//! appforge Core - Application Definition Types
//!
//! Pure data structures shared by the storage and API crates. An
//! [`Application`] is a declarative document consumed by the code
//! generator; apart from its `name` the document is opaque and passed
//! through unchanged.

pub mod error;
pub mod filter;
pub mod generation;
pub mod layout;

pub use error::{DocumentKind, ForgeError, ForgeResult, GenerationError, StoreError};
pub use filter::SearchFilter;
pub use generation::{CodeGenerator, GenerationOutcome, GenerationRequest};
pub use layout::{validate_name, DataLayout, StaticDocument};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the table an application is built on.
pub const TABLE_FIELD: &str = "table";

// ============================================================================
// APPLICATION
// ============================================================================

/// A persisted application definition.
///
/// `name` is the primary key and the on-disk file identifier. Every other
/// field (table, module, version, team, fields, enum/zoom relations...) is
/// kept in `document` exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    #[serde(flatten)]
    pub document: Map<String, Value>,
}

impl Application {
    /// Create an application with an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            document: Map::new(),
        }
    }

    /// Builder-style setter for an opaque document field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set_field(key, value);
        self
    }

    /// Set an opaque document field. Setting `name` renames the application.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key == "name" {
            if let Value::String(name) = value {
                self.name = name;
            }
            return;
        }
        self.document.insert(key, value);
    }

    /// Get an opaque document field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// The table reference, when it is a string.
    pub fn table(&self) -> Option<&str> {
        self.field(TABLE_FIELD).and_then(Value::as_str)
    }

    /// Parse a create payload. The payload must be a JSON object with a
    /// string `name`.
    pub fn from_slice(bytes: &[u8]) -> ForgeResult<Self> {
        let app: Application = serde_json::from_slice(bytes)?;
        Ok(app)
    }

    /// Parse an update payload and force its name.
    ///
    /// The body's own `name` (if any) is ignored; the caller supplies the
    /// authoritative one.
    pub fn from_slice_with_name(bytes: &[u8], name: &str) -> ForgeResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Object(mut document) = value else {
            return Err(ForgeError::data("Application document must be a JSON object"));
        };
        document.remove("name");
        Ok(Self {
            name: name.to_string(),
            document,
        })
    }

    /// Serialize as pretty JSON for storage.
    pub fn to_json_pretty(&self) -> ForgeResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}
