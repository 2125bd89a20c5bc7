//! Server configuration.

/// Default cap on operations per BatchSync call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Default cap on resolutions per ResolveConflicts call.
pub const DEFAULT_MAX_RESOLUTIONS: usize = 50;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum operations in one BatchSync request. Larger batches are
    /// rejected whole. This cap is the only backpressure the core applies.
    pub max_batch_size: usize,
    /// Maximum resolutions in one ResolveConflicts request.
    pub max_resolutions: usize,
    /// Whether BatchSync responses carry the catch-up feed.
    pub include_catch_up: bool,
}

impl ServerConfig {
    /// Creates a configuration with default limits.
    pub fn new() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_resolutions: DEFAULT_MAX_RESOLUTIONS,
            include_catch_up: true,
        }
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the maximum number of resolutions per call.
    pub fn with_max_resolutions(mut self, size: usize) -> Self {
        self.max_resolutions = size;
        self
    }

    /// Enables or disables the catch-up feed in BatchSync responses.
    pub fn with_catch_up(mut self, enabled: bool) -> Self {
        self.include_catch_up = enabled;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.max_resolutions, 50);
        assert!(config.include_catch_up);
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_max_batch_size(10)
            .with_max_resolutions(5)
            .with_catch_up(false);

        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.max_resolutions, 5);
        assert!(!config.include_catch_up);
    }
}
