//! Registry configuration.

/// Configuration for an index registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Whether `add` fan-out stops at the first failing index.
    ///
    /// When false (the default), every index is still visited and the first
    /// error is reported after the fan-out completes. Indexes updated before
    /// a failure stay updated either way.
    pub fail_fast: bool,

    /// Run a full stale-entry sweep every this many `add` calls
    /// (`None` = lazy eviction only).
    ///
    /// Lazy eviction only reclaims entries that a read happens to touch;
    /// the interval bounds stale growth on write-heavy, rarely-read indexes.
    pub auto_prune_interval: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            auto_prune_interval: None,
        }
    }
}

impl RegistryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether fan-out stops at the first failing index.
    #[must_use]
    pub const fn fail_fast(mut self, value: bool) -> Self {
        self.fail_fast = value;
        self
    }

    /// Sets the automatic sweep interval.
    #[must_use]
    pub const fn auto_prune_interval(mut self, adds: u64) -> Self {
        self.auto_prune_interval = Some(adds);
        self
    }
}
