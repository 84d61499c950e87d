//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use appforge_core::{CodeGenerator, DataLayout};
use appforge_storage::{ApplicationCache, DocumentStore, FileStore};

use crate::config::ApiConfig;
use crate::generation::{GenerationTrigger, ProcessGenerator, UnconfiguredGenerator};

/// The cache type used by the API: a snapshot cache over any store.
pub type ApiCache = ApplicationCache<dyn DocumentStore>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Snapshot cache; also the only handle routes use to reach the store.
    pub cache: Arc<ApiCache>,
    pub generation: Arc<GenerationTrigger>,
    pub config: Arc<ApiConfig>,
    pub start_time: Instant,
}

impl AppState {
    /// Assemble state from explicit parts.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn CodeGenerator>,
        config: ApiConfig,
    ) -> Self {
        let generation = GenerationTrigger::new(generator)
            .with_timeout(config.generation_timeout)
            .with_validation(config.validate_generation);

        Self {
            cache: Arc::new(ApplicationCache::new(store)),
            generation: Arc::new(generation),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Assemble the production state: a file store under the configured data
    /// root and the configured engine command, if any.
    pub fn from_config(config: ApiConfig) -> Self {
        let store = FileStore::new(DataLayout::new(config.data_dir.clone()))
            .with_skip_invalid(config.skip_invalid_files);

        let generator: Arc<dyn CodeGenerator> = match config
            .generator_cmd
            .as_deref()
            .and_then(ProcessGenerator::from_command_line)
        {
            Some(process) => Arc::new(process),
            None => {
                tracing::warn!("APPFORGE_GENERATOR_CMD not set, code generation is disabled");
                Arc::new(UnconfiguredGenerator)
            }
        };

        Self::new(Arc::new(store), generator, config)
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.cache.store()
    }
}

crate::impl_from_ref!(Arc<ApiCache>, cache);
crate::impl_from_ref!(Arc<GenerationTrigger>, generation);
crate::impl_from_ref!(Arc<ApiConfig>, config);
crate::impl_from_ref!(Instant, start_time);
