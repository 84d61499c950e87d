//! appforge Test Utilities
//!
//! Shared test infrastructure for the appforge workspace:
//! - A temporary data root laid out the way the server expects
//! - A scripted code generator
//! - Proptest generators for applications and query strings
//! - Fixtures for common scenarios

pub use appforge_core::{
    Application, CodeGenerator, DataLayout, ForgeError, GenerationError, SearchFilter,
    StaticDocument,
};
pub use appforge_storage::{ApplicationCache, DocumentStore, FileStore, InMemoryStore};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tempfile::TempDir;

// ============================================================================
// DATA ROOT
// ============================================================================

/// A throwaway data directory. Deleted when dropped.
#[derive(Debug)]
pub struct TestDataRoot {
    dir: TempDir,
}

impl TestDataRoot {
    /// Create an empty data root. No subdirectories exist yet.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(self.dir.path())
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(self.layout())
    }

    pub fn write_template_index(&self, raw: &str) -> std::io::Result<()> {
        fs::write(self.path().join("template.index.json"), raw)
    }

    pub fn write_table_index(&self, raw: &str) -> std::io::Result<()> {
        fs::write(self.path().join("table.index.json"), raw)
    }

    pub fn write_table(&self, name: &str, raw: &str) -> std::io::Result<()> {
        let dir = self.path().join("table");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{}.json", name)), raw)
    }

    /// Write an application file with arbitrary contents and file name.
    pub fn write_application_raw(&self, file_name: &str, raw: &str) -> std::io::Result<PathBuf> {
        let dir = self.path().join("application");
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, raw)?;
        Ok(path)
    }

    /// Write a well-formed application file named after the application.
    pub fn write_application(&self, app: &Application) -> std::io::Result<PathBuf> {
        let raw = serde_json::to_string_pretty(app)?;
        self.write_application_raw(&format!("{}.json", app.name), &raw)
    }

    /// Read back an application file as parsed JSON.
    pub fn read_application(&self, name: &str) -> std::io::Result<serde_json::Value> {
        let bytes = fs::read(self.layout().application_path(name))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Names of files currently in the application directory, sorted.
    pub fn application_files(&self) -> std::io::Result<Vec<String>> {
        let dir = self.path().join("application");
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}

// ============================================================================
// SCRIPTED GENERATOR
// ============================================================================

/// One recorded call to [`ScriptedGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub application: Option<String>,
    pub session: Option<String>,
    pub templates: Vec<String>,
}

/// Code generator returning a fixed result and recording every call.
#[derive(Debug)]
pub struct ScriptedGenerator {
    result: Result<PathBuf, GenerationError>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl ScriptedGenerator {
    /// Succeed with the given output path.
    pub fn succeeding(output: impl Into<PathBuf>) -> Self {
        Self {
            result: Ok(output.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            result: Err(GenerationError::EngineFailed {
                reason: reason.into(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CodeGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        application: Option<&str>,
        session: Option<&str>,
        templates: &[String],
    ) -> Result<PathBuf, GenerationError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(GenerateCall {
                application: application.map(str::to_string),
                session: session.map(str::to_string),
                templates: templates.to_vec(),
            });
        self.result.clone()
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for application documents and raw queries.

    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    /// A name safe to use as a file stem.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,11}"
    }

    pub fn arb_table() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["customers", "orders", "employees", "invoices"])
            .prop_map(str::to_string)
    }

    /// An application with a table reference and some opaque fields.
    pub fn arb_application() -> impl Strategy<Value = Application> {
        (
            arb_name(),
            arb_table(),
            prop::option::of("[a-z]{1,8}"),
            prop::option::of("[0-9]\\.[0-9]"),
        )
            .prop_map(|(name, table, module, version)| {
                let mut app = Application::new(name).with_field("table", json!(table));
                if let Some(module) = module {
                    app.set_field("module", json!(module));
                }
                if let Some(version) = version {
                    app.set_field("version", json!(version));
                }
                app
            })
    }

    /// Applications with distinct names.
    pub fn arb_applications(max: usize) -> impl Strategy<Value = Vec<Application>> {
        prop::collection::btree_map(arb_name(), arb_application(), 0..max).prop_map(|apps| {
            apps.into_iter()
                .map(|(name, mut app)| {
                    app.name = name;
                    app
                })
                .collect()
        })
    }

    /// One `key=value` token, sometimes malformed.
    pub fn arb_query_token() -> impl Strategy<Value = String> {
        prop_oneof![
            (prop::sample::select(vec!["name", "table", "q", "other"]), "[a-z]{0,6}")
                .prop_map(|(k, v)| format!("{}={}", k, v)),
            "[a-z=]{0,8}",
        ]
    }

    /// A raw query string made of arbitrary tokens.
    pub fn arb_raw_query() -> impl Strategy<Value = String> {
        prop::collection::vec(arb_query_token(), 0..6).prop_map(|tokens| tokens.join("&"))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built applications and reference documents.

    use super::*;
    use serde_json::json;

    pub const TEMPLATE_INDEX: &str = r#"[{"name":"api","path":"templates/api"},{"name":"ui","path":"templates/ui"}]"#;

    pub const TABLE_INDEX: &str = r#"[{"name":"customers"},{"name":"orders"}]"#;

    pub const CUSTOMERS_TABLE: &str =
        r#"{"name":"customers","columns":[{"name":"id","type":"int"},{"name":"email","type":"string"}]}"#;

    /// An application on the `customers` table.
    pub fn crm_application() -> Application {
        Application::new("crm")
            .with_field("table", json!("customers"))
            .with_field("module", json!("sales"))
            .with_field("version", json!("1.0"))
            .with_field("fields", json!([{"name": "email", "label": "Email"}]))
    }

    /// An application on the `orders` table.
    pub fn orders_application() -> Application {
        Application::new("orders")
            .with_field("table", json!("orders"))
            .with_field("team", json!("fulfilment"))
    }

    /// An application whose name equals another application's table.
    pub fn customers_application() -> Application {
        Application::new("customers").with_field("table", json!("accounts"))
    }

    /// A data root populated with the static documents and three applications.
    pub fn populated_root() -> std::io::Result<TestDataRoot> {
        let root = TestDataRoot::new()?;
        root.write_template_index(TEMPLATE_INDEX)?;
        root.write_table_index(TABLE_INDEX)?;
        root.write_table("customers", CUSTOMERS_TABLE)?;
        for app in [crm_application(), orders_application(), customers_application()] {
            root.write_application(&app)?;
        }
        Ok(root)
    }
}
