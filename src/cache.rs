//! Memoized processing results.
//!
//! [`ResultCache`] maps a (fingerprint, variant) pair to the frames,
//! transcript, and generated text of a completed run. There is no eviction,
//! capacity bound, or expiry: entries live until [`ResultCache::clear`] is
//! called or the cache is dropped. Callers that need bounded memory must
//! wrap it.
//!
//! The cache is an ordinary value. Construct one per application session
//! and hand out references; it is `Send + Sync`.
//!
//! # Example
//!
//! ```
//! use keyreel::{CacheEntry, Fingerprint, ResultCache};
//!
//! let cache = ResultCache::new();
//! let fingerprint = Fingerprint::of(b"video bytes");
//! cache.store(
//!     fingerprint.clone(),
//!     "Professional",
//!     CacheEntry::new(Vec::new(), "hello".to_string(), "caption".to_string()),
//! );
//!
//! let entry = cache.lookup(&fingerprint, "Professional").unwrap();
//! assert_eq!(entry.transcript(), "hello");
//! assert!(cache.lookup(&fingerprint, "Humorous").is_none());
//!
//! cache.clear();
//! assert!(cache.is_empty());
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{fingerprint::Fingerprint, frame::Frame};

/// Cache key: content fingerprint plus generation variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Hash of the uploaded bytes.
    pub fingerprint: Fingerprint,
    /// Generation parameter, such as the requested tone.
    pub variant: String,
}

impl CacheKey {
    /// Build a key from its parts.
    pub fn new(fingerprint: Fingerprint, variant: impl Into<String>) -> Self {
        Self {
            fingerprint,
            variant: variant.into(),
        }
    }
}

/// The result of one full processing run.
///
/// Entries are immutable once built; the cache hands them out behind an
/// [`Arc`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    frames: Vec<Frame>,
    transcript: String,
    generated_text: String,
}

impl CacheEntry {
    /// Bundle the outputs of a run.
    pub fn new(frames: Vec<Frame>, transcript: String, generated_text: String) -> Self {
        Self {
            frames,
            transcript,
            generated_text,
        }
    }

    /// Selected key frames, in ordinal order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Transcript text; empty when transcription produced nothing.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Text returned by the generative service.
    pub fn generated_text(&self) -> &str {
        &self.generated_text
    }
}

/// Process-lifetime store of completed runs.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, Arc<CacheEntry>>>,
}

impl ResultCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the entry stored for `(fingerprint, variant)`, if any.
    pub fn lookup(&self, fingerprint: &Fingerprint, variant: &str) -> Option<Arc<CacheEntry>> {
        let key = CacheKey::new(fingerprint.clone(), variant);
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Store `entry` under `(fingerprint, variant)`, replacing any previous
    /// entry for that key.
    pub fn store(&self, fingerprint: Fingerprint, variant: impl Into<String>, entry: CacheEntry) {
        let key = CacheKey::new(fingerprint, variant);
        log::debug!(
            "Caching result for {} ({}, {} frames)",
            key.fingerprint,
            key.variant,
            entry.frames.len()
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(entry));
    }

    /// Remove every entry at once.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        log::debug!("Clearing {} cached results", entries.len());
        entries.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
