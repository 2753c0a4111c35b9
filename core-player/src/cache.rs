//! # Prepared-Source Cache
//!
//! Records which source URIs the host session has already successfully
//! prepared, so re-selecting a source skips the prepare round-trip.
//!
//! An entry guarantees that the host prepared the URI at least once and that
//! its recorded duration is valid; it does NOT guarantee the underlying media
//! is still reachable - a later play can still fail. Entries are age-bounded,
//! not size-bounded, and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A source URI the host session has successfully prepared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSource {
    /// The source URI this entry is keyed by.
    pub source: String,
    /// Duration in seconds as reported by the host at prepare time.
    pub duration: f64,
    /// Whether the prepare completed. Entries with `loaded = false` never
    /// satisfy a lookup.
    pub loaded: bool,
    /// Milliseconds since the Unix epoch when the prepare completed.
    pub loaded_at_ms: u64,
}

/// In-memory cache of prepared sources, keyed by URI.
#[derive(Debug, Default)]
pub(crate) struct SourceCache {
    entries: HashMap<String, PreparedSource>,
}

impl SourceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Look up a fully prepared entry for `source`.
    pub(crate) fn get_loaded(&self, source: &str) -> Option<&PreparedSource> {
        self.entries.get(source).filter(|entry| entry.loaded)
    }

    pub(crate) fn insert(&mut self, entry: PreparedSource) {
        self.entries.insert(entry.source.clone(), entry);
    }

    /// Drop entries older than `max_age` relative to `now_ms`. Returns how
    /// many entries were removed.
    pub(crate) fn clear_stale(&mut self, now_ms: u64, max_age: Duration) -> usize {
        let max_age_ms = max_age.as_millis() as u64;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now_ms.saturating_sub(entry.loaded_at_ms) <= max_age_ms);
        before - self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, loaded_at_ms: u64) -> PreparedSource {
        PreparedSource {
            source: source.to_string(),
            duration: 30.0,
            loaded: true,
            loaded_at_ms,
        }
    }

    #[test]
    fn lookup_ignores_unloaded_entries() {
        let mut cache = SourceCache::new();
        cache.insert(PreparedSource {
            loaded: false,
            ..entry("https://example.com/a.mp3", 1_000)
        });

        assert!(cache.get_loaded("https://example.com/a.mp3").is_none());

        cache.insert(entry("https://example.com/a.mp3", 2_000));
        let hit = cache.get_loaded("https://example.com/a.mp3").unwrap();
        assert_eq!(hit.duration, 30.0);
        assert_eq!(hit.loaded_at_ms, 2_000);
    }

    #[test]
    fn clear_stale_removes_exactly_the_expired_entries() {
        let now_ms = 100_000;
        let mut cache = SourceCache::new();
        cache.insert(entry("https://example.com/old.mp3", now_ms - 40_000));
        cache.insert(entry("https://example.com/fresh.mp3", now_ms - 5_000));

        let removed = cache.clear_stale(now_ms, Duration::from_millis(30_000));
        assert_eq!(removed, 1);
        assert!(cache.get_loaded("https://example.com/old.mp3").is_none());
        assert!(cache.get_loaded("https://example.com/fresh.mp3").is_some());
    }

    #[test]
    fn clear_stale_keeps_entries_exactly_at_the_boundary() {
        let now_ms = 50_000;
        let mut cache = SourceCache::new();
        cache.insert(entry("https://example.com/edge.mp3", now_ms - 30_000));

        let removed = cache.clear_stale(now_ms, Duration::from_millis(30_000));
        assert_eq!(removed, 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = SourceCache::new();
        cache.insert(entry("https://example.com/a.mp3", 1));
        cache.insert(entry("https://example.com/b.mp3", 2));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
