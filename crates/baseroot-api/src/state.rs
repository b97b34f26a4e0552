//! Shared application state.

use std::sync::Arc;

use baseroot_anchor::Anchorer;
use baseroot_pinning::Pinner;

use crate::config::ApiConfig;
use crate::journal::{MemoryJournal, UploadJournal};

/// Handles shared by every request. Cloning is cheap; all fields are
/// reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub pinner: Arc<dyn Pinner>,
    pub anchorer: Arc<dyn Anchorer>,
    pub journal: Arc<dyn UploadJournal>,
    /// Overrides the uploaded file name as the pin name.
    pub pin_name: Option<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("pinner", &self.pinner.backend_name())
            .field("payer", &self.anchorer.payer())
            .field("journal", &self.journal.kind())
            .field("pin_name", &self.pin_name)
            .finish()
    }
}

impl AppState {
    /// State with an in-memory journal.
    pub fn new(config: ApiConfig, pinner: Arc<dyn Pinner>, anchorer: Arc<dyn Anchorer>) -> Self {
        Self::with_journal(config, pinner, anchorer, Arc::new(MemoryJournal::new()))
    }

    pub fn with_journal(
        config: ApiConfig,
        pinner: Arc<dyn Pinner>,
        anchorer: Arc<dyn Anchorer>,
        journal: Arc<dyn UploadJournal>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pinner,
            anchorer,
            journal,
            pin_name: None,
        }
    }

    pub fn with_pin_name(mut self, pin_name: Option<String>) -> Self {
        self.pin_name = pin_name;
        self
    }

    /// Name to pin `file_name` under.
    pub fn pin_name_for<'a>(&'a self, file_name: &'a str) -> &'a str {
        self.pin_name.as_deref().unwrap_or(file_name)
    }
}
