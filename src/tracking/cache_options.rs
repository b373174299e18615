/// Settings fixed when a [`TrackingCache`](super::TrackingCache) is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Write the library with 2-space indentation instead of compact JSON.
    pub pretty_json: bool,
    /// Emit `debug` events about what the cache loads, adds, prunes and
    /// rehashes.
    pub diagnostics: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            pretty_json: true,
            diagnostics: false,
        }
    }
}

impl CacheOptions {
    pub fn compact(mut self) -> Self {
        self.pretty_json = false;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
