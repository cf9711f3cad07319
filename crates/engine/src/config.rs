//! Editor configuration from environment variables

/// Default undo depth
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Undo entries kept before the oldest is dropped
    pub history_capacity: usize,
    /// Diagnostic logging in the CLI
    pub verbose: bool,
    /// Pages between runtime yields in async decode/encode (0 = never)
    pub yield_every: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            verbose: false,
            yield_every: 1,
        }
    }
}

impl EditorConfig {
    /// Read `FUMEN_HISTORY_CAPACITY`, `FUMEN_VERBOSE` and `FUMEN_YIELD_EVERY`
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        use std::env;

        let history_capacity = env::var("FUMEN_HISTORY_CAPACITY")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_HISTORY_CAPACITY)
            .max(1);

        let verbose = env::var("FUMEN_VERBOSE")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let yield_every = env::var("FUMEN_YIELD_EVERY")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1);

        Self {
            history_capacity,
            verbose,
            yield_every,
        }
    }
}
