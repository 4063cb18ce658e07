use std::path::PathBuf;
use std::sync::Arc;

use threadloom_context::{TiktokenCounter, TokenCounter};

use crate::config::StoreConfig;
use crate::error::{PersistError, Result};
use crate::pricing::PricingCalculator;
use crate::schema::{MessageValidator, SchemaValidator};
use crate::storage::{LocalStorage, Storage};
use crate::store::ThreadStore;

pub struct ThreadStoreBuilder {
    storage: Option<Arc<dyn Storage>>,
    root_dir: PathBuf,
    message_validator: Option<Arc<dyn MessageValidator>>,
    token_counter: Option<Arc<dyn TokenCounter>>,
    pricing: Option<Arc<dyn PricingCalculator>>,
}

impl ThreadStoreBuilder {
    pub fn new() -> Self {
        Self {
            storage: None,
            root_dir: PathBuf::from("threads"),
            message_validator: None,
            token_counter: None,
            pricing: None,
        }
    }

    /// Storage root, pricing and a local-disk backend from config.
    pub fn from_config(config: &StoreConfig) -> Self {
        let mut builder = Self::new()
            .local_storage()
            .root_dir(config.storage.root_dir.clone());
        if !config.pricing.models.is_empty() {
            builder = builder.pricing(Arc::new(config.pricing.to_calculator()));
        }
        builder
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn local_storage(self) -> Self {
        self.storage(Arc::new(LocalStorage::new()))
    }

    pub fn root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn message_validator(mut self, validator: Arc<dyn MessageValidator>) -> Self {
        self.message_validator = Some(validator);
        self
    }

    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = Some(counter);
        self
    }

    pub fn pricing(mut self, pricing: Arc<dyn PricingCalculator>) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn build(self) -> Result<ThreadStore> {
        let storage = self
            .storage
            .ok_or_else(|| PersistError::InvalidState("storage is required".to_string()))?;
        let validator = self
            .message_validator
            .map(SchemaValidator::new)
            .unwrap_or_default();
        let counter = match self.token_counter {
            Some(counter) => counter,
            None => Arc::new(TiktokenCounter::new().map_err(|e| {
                PersistError::InvalidState(format!("failed to load tokenizer: {}", e))
            })?),
        };

        tracing::debug!(root_dir = %self.root_dir.display(), "Building thread store");
        Ok(ThreadStore::new(
            storage,
            self.root_dir,
            validator,
            counter,
            self.pricing,
        ))
    }
}

impl Default for ThreadStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
