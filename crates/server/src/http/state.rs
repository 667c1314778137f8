use std::sync::{Arc, OnceLock};

use data_loader::DEFAULT_TAG_DELIMITER;

use crate::config::Config;
use crate::error::RecommendError;
use crate::resolver::RecommendationService;

/// Per-request settings applied by the handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSettings {
    pub default_top_n: usize,
    pub max_top_n: usize,
    /// Joins an item's tags back into the `genres` string of a response
    pub tag_delimiter: char,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            max_top_n: 50,
            tag_delimiter: DEFAULT_TAG_DELIMITER,
        }
    }
}

impl From<&Config> for ApiSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_top_n: config.default_top_n,
            max_top_n: config.max_top_n,
            tag_delimiter: config.delimiter(),
        }
    }
}

/// Shared application state.
///
/// The service slot is filled exactly once at startup; until then every
/// lookup answers with [`RecommendError::NotReady`].
#[derive(Clone, Default)]
pub struct AppState {
    service: Arc<OnceLock<Arc<RecommendationService>>>,
    pub settings: ApiSettings,
}

impl AppState {
    /// Creates a state with no service loaded yet
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            service: Arc::new(OnceLock::new()),
            settings,
        }
    }

    /// Creates a state that is ready to serve
    pub fn with_service(service: Arc<RecommendationService>, settings: ApiSettings) -> Self {
        let state = Self::new(settings);
        // Fresh lock, cannot already be set
        let _ = state.service.set(service);
        state
    }

    /// Publish the loaded service. Returns `false` if one was already installed.
    pub fn install(&self, service: Arc<RecommendationService>) -> bool {
        self.service.set(service).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.service.get().is_some()
    }

    pub fn service(&self) -> Result<Arc<RecommendationService>, RecommendError> {
        self.service.get().cloned().ok_or(RecommendError::NotReady)
    }

    /// Requested size clamped to the configured maximum
    pub fn top_n(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_top_n)
            .min(self.settings.max_top_n)
    }
}
