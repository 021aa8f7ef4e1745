//! Store configuration.

/// Default segment size threshold before rollover: 10 MiB.
pub const DEFAULT_SEGMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Size threshold (bytes) at which the active segment is rolled.
    pub max_segment_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_segment_size: DEFAULT_SEGMENT_SIZE,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the segment size threshold.
    #[must_use]
    pub const fn max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert_eq!(config.max_segment_size, DEFAULT_SEGMENT_SIZE);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().create_if_missing(false).max_segment_size(16);

        assert!(!config.create_if_missing);
        assert_eq!(config.max_segment_size, 16);
    }
}
