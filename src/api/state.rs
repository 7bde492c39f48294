use std::sync::Arc;

use crate::abbrev::AbbreviationConfig;
use crate::config::AppConfig;
use crate::ingest::IngestOptions;

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub options: Arc<IngestOptions>,
    pub abbreviations: Arc<AbbreviationConfig>,
    pub cors_origin: String,
}

impl AppState {
    pub fn new(config: &AppConfig, abbreviations: AbbreviationConfig) -> Self {
        Self {
            options: Arc::new(IngestOptions {
                min_confidence: config.min_confidence,
                format_override: None,
            }),
            abbreviations: Arc::new(abbreviations),
            cors_origin: config.server.cors_origin.clone(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&AppConfig::default(), AbbreviationConfig::default())
    }
}
