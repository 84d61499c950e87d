//! Filesystem-backed document store.
//!
//! Every operation runs on the blocking pool so request handlers never wait
//! on disk I/O from an async worker thread.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use appforge_core::{
    validate_name, Application, DataLayout, DocumentKind, ForgeResult, StaticDocument, StoreError,
};

use crate::store::DocumentStore;

/// Distinguishes temporary files of concurrent writes.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Suffix of in-flight writes. Application files always end in `.json`.
const TEMP_SUFFIX: &str = ".tmp";

/// Document store reading and writing JSON files under a data root.
#[derive(Debug, Clone)]
pub struct FileStore {
    layout: DataLayout,
    /// Skip unparsable application files during a scan instead of failing it.
    skip_invalid: bool,
}

impl FileStore {
    /// Create a store over the given layout. Invalid files are skipped.
    pub fn new(layout: DataLayout) -> Self {
        Self {
            layout,
            skip_invalid: true,
        }
    }

    /// Choose whether an unparsable application file fails the whole scan.
    pub fn with_skip_invalid(mut self, skip_invalid: bool) -> Self {
        self.skip_invalid = skip_invalid;
        self
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn read_static(&self, doc: &StaticDocument) -> ForgeResult<Vec<u8>> {
        let path = self.layout.static_path(doc)?;
        let (kind, name) = describe(doc);
        blocking(move || {
            fs::read(&path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => StoreError::NotFound { kind, name }.into(),
                _ => io_error(&path, e).into(),
            })
        })
        .await
    }

    async fn scan_applications(&self) -> ForgeResult<BTreeMap<String, Application>> {
        let dir = self.layout.application_dir();
        let skip_invalid = self.skip_invalid;
        blocking(move || scan_dir(&dir, skip_invalid)).await
    }

    async fn write_application(&self, app: &Application) -> ForgeResult<()> {
        validate_name(&app.name)?;
        let bytes = app.to_json_pretty()?;
        let dir = self.layout.application_dir();
        let path = self.layout.application_path(&app.name);
        let name = app.name.clone();
        blocking(move || write_atomic(&dir, &path, &name, &bytes)).await
    }

    async fn ping(&self) -> ForgeResult<()> {
        let root = self.layout.root().to_path_buf();
        blocking(move || {
            let meta = fs::metadata(&root).map_err(|e| io_error(&root, e))?;
            if meta.is_dir() {
                Ok(())
            } else {
                Err(StoreError::Io {
                    path: root,
                    reason: "data root is not a directory".to_string(),
                }
                .into())
            }
        })
        .await
    }
}

/// Run a blocking closure on the blocking pool.
async fn blocking<T, F>(f: F) -> ForgeResult<T>
where
    F: FnOnce() -> ForgeResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| StoreError::TaskFailed {
        reason: e.to_string(),
    })?
}

fn describe(doc: &StaticDocument) -> (DocumentKind, String) {
    match doc {
        StaticDocument::TemplateIndex => (DocumentKind::TemplateIndex, "template.index".into()),
        StaticDocument::TableIndex => (DocumentKind::TableIndex, "table.index".into()),
        StaticDocument::Table(name) => (DocumentKind::Table, name.clone()),
    }
}

fn io_error(path: &Path, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

/// Parse every regular file in `dir` as an application.
///
/// A missing directory is an empty collection. In-flight writes are never
/// read; every other regular file is, dot-prefixed ones included.
fn scan_dir(dir: &Path, skip_invalid: bool) -> ForgeResult<BTreeMap<String, Application>> {
    let mut apps = BTreeMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), "Application directory missing, scanning as empty");
            return Ok(apps);
        }
        Err(e) => return Err(io_error(dir, e).into()),
    };

    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();

        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;
        if !file_type.is_file() || is_temp_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        match load_application(&path) {
            Ok(app) => {
                tracing::debug!(name = %app.name, path = %path.display(), "Add application");
                if let Some(previous) = apps.insert(app.name.clone(), app) {
                    tracing::warn!(
                        name = %previous.name,
                        path = %path.display(),
                        "Duplicate application name, keeping the last file read"
                    );
                }
            }
            Err(err) if skip_invalid => {
                tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable application file");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(apps)
}

fn is_temp_file(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.ends_with(TEMP_SUFFIX)
}

fn load_application(path: &Path) -> Result<Application, StoreError> {
    let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
    Application::from_slice(&bytes).map_err(|e| StoreError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write to a hidden sibling and rename over the target.
fn write_atomic(dir: &Path, path: &Path, name: &str, bytes: &[u8]) -> ForgeResult<()> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp: PathBuf = dir.join(format!(".{}.{}{}", std::process::id(), seq, TEMP_SUFFIX));

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(&tmp, e).into());
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(path, e).into());
    }

    tracing::debug!(name, path = %path.display(), "Application written");
    Ok(())
}
