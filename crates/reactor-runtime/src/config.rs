//! Reactor configuration

use reactor_core::constants::DEFAULT_PRIORITY_LEVELS;

/// Configuration for constructing a [`crate::reactor::Reactor`].
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Number of strict-priority activation queues. Events default to
    /// the middle level (`priority_levels / 2`).
    pub priority_levels: usize,

    /// Initial capacity reserved in the event arena.
    pub initial_arena_capacity: usize,

    /// Initial capacity reserved in the timer heap.
    pub initial_timer_capacity: usize,

    /// Force a specific backend by name instead of the platform default.
    /// Mirrors `EVENT_SHOW_METHOD`; mainly useful so tests can pin
    /// `"poll"` explicitly.
    pub backend_override: Option<&'static str>,

    /// Enable debug-level logging for this reactor's lifetime.
    pub debug_logging: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            priority_levels: DEFAULT_PRIORITY_LEVELS,
            initial_arena_capacity: 64,
            initial_timer_capacity: 64,
            backend_override: None,
            debug_logging: false,
        }
    }
}

impl ReactorConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of priority levels.
    pub fn priority_levels(mut self, n: usize) -> Self {
        self.priority_levels = n;
        self
    }

    /// Set the initial event arena capacity.
    pub fn initial_arena_capacity(mut self, n: usize) -> Self {
        self.initial_arena_capacity = n;
        self
    }

    /// Set the initial timer heap capacity.
    pub fn initial_timer_capacity(mut self, n: usize) -> Self {
        self.initial_timer_capacity = n;
        self
    }

    /// Force a specific backend by name.
    pub fn backend_override(mut self, name: &'static str) -> Self {
        self.backend_override = Some(name);
        self
    }

    /// Enable debug logging.
    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate configuration, mirroring the reactor's own contract
    /// panics so misconfiguration is caught before construction.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.priority_levels == 0 {
            return Err("priority_levels must be at least 1");
        }
        Ok(())
    }
}
