//! Per-key memoization of finished OpenAPI documents.
//!
//! `DocumentCache` builds each document at most once per
//! `(document, host, base path)` key. Concurrent callers for the same key
//! wait on the key's build lock and then share the result. A failed build
//! is not stored, so the next request retries it.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::openapi::OpenApiDocument;

/// Identifies one cached document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub document: String,
    pub host: String,
    pub base_path: String,
}

impl DocumentKey {
    pub fn new(document: impl Into<String>, host: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            host: host.into(),
            base_path: base_path.into(),
        }
    }
}

type Slot = Arc<Mutex<Option<Arc<OpenApiDocument>>>>;

/// Thread-safe document cache.
#[derive(Default)]
pub struct DocumentCache {
    slots: DashMap<DocumentKey, Slot>,
}

impl DocumentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently built. Waits for builds in flight.
    pub fn len(&self) -> usize {
        // Slots are locked only after every map guard is released.
        let slots: Vec<Slot> = self.slots.iter().map(|entry| Arc::clone(entry.value())).collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached document for `key`, running `build` if there is none.
    ///
    /// Only one build per key runs at a time; builds for different keys run
    /// in parallel.
    ///
    /// # Errors
    ///
    /// Returns the build's error. Nothing is stored in that case.
    pub fn get_or_build<F>(&self, key: &DocumentKey, build: F) -> Result<Arc<OpenApiDocument>>
    where
        F: FnOnce() -> Result<OpenApiDocument>,
    {
        // The map guard must be released before blocking on the slot.
        let slot = self.slots.entry(key.clone()).or_default().value().clone();

        let mut guard = slot.lock();
        if let Some(document) = guard.as_ref() {
            debug!(document = %key.document, host = %key.host, "OpenAPI document cache hit");
            return Ok(Arc::clone(document));
        }

        info!(document = %key.document, host = %key.host, base_path = %key.base_path, "Building OpenAPI document...");
        match build() {
            Ok(document) => {
                let document = Arc::new(document);
                *guard = Some(Arc::clone(&document));
                info!(document = %key.document, "OpenAPI document built successfully");
                Ok(document)
            }
            Err(e) => {
                warn!(document = %key.document, error = %e, "Failed to build OpenAPI document");
                Err(e)
            }
        }
    }

    /// Drops every cached document so the next request rebuilds.
    pub fn invalidate(&self) {
        self.slots.clear();
        info!("OpenAPI document cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthesisError;
    use crate::openapi::{Components, Info};
    use indexmap::IndexMap;

    fn document(title: &str) -> OpenApiDocument {
        OpenApiDocument {
            openapi: "3.0.4".into(),
            info: Info {
                title: title.into(),
                version: "1".into(),
            },
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: Components::default(),
        }
    }

    #[test]
    fn test_second_request_is_served_from_cache() {
        let cache = DocumentCache::new();
        let key = DocumentKey::new("v1", "localhost", "");
        let first = cache.get_or_build(&key, || Ok(document("a"))).unwrap();
        let second = cache
            .get_or_build(&key, || panic!("document rebuilt"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_differ_by_host() {
        let cache = DocumentCache::new();
        let a = cache
            .get_or_build(&DocumentKey::new("v1", "a.example", ""), || Ok(document("a")))
            .unwrap();
        let b = cache
            .get_or_build(&DocumentKey::new("v1", "b.example", ""), || Ok(document("b")))
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_are_retried() {
        let cache = DocumentCache::new();
        let key = DocumentKey::new("v1", "localhost", "");
        let err = cache
            .get_or_build(&key, || Err(SynthesisError::unreachable("boom")))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UnreachableConfiguration(_)));
        assert!(cache.is_empty());

        let doc = cache.get_or_build(&key, || Ok(document("ok"))).unwrap();
        assert_eq!(doc.info.title, "ok");
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let cache = DocumentCache::new();
        let key = DocumentKey::new("v1", "localhost", "/api");
        let first = cache.get_or_build(&key, || Ok(document("a"))).unwrap();
        cache.invalidate();
        let second = cache.get_or_build(&key, || Ok(document("b"))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
