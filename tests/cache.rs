//! Result cache tests.

use std::{sync::Arc, thread};

use image::DynamicImage;
use keyreel::{CacheEntry, CacheKey, ContentTone, Fingerprint, Frame, ResultCache};

fn entry(text: &str) -> CacheEntry {
    CacheEntry::new(
        vec![Frame::new(3, DynamicImage::new_luma8(2, 2))],
        "hello there".to_string(),
        text.to_string(),
    )
}

#[test]
fn empty_cache_misses() {
    let cache = ResultCache::new();
    assert!(cache.is_empty());
    assert!(cache.lookup(&Fingerprint::of(b"video"), "Professional").is_none());
}

#[test]
fn store_then_lookup_returns_entry() {
    let cache = ResultCache::new();
    let fingerprint = Fingerprint::of(b"video");

    cache.store(fingerprint.clone(), "Professional", entry("caption"));

    let found = cache
        .lookup(&fingerprint, "Professional")
        .expect("Entry should be cached");
    assert_eq!(found.generated_text(), "caption");
    assert_eq!(found.transcript(), "hello there");
    assert_eq!(found.frames().len(), 1);
    assert_eq!(found.frames()[0].ordinal(), 3);
    assert_eq!(cache.len(), 1);
}

#[test]
fn variants_are_independent() {
    let cache = ResultCache::new();
    let fingerprint = Fingerprint::of(b"video");

    cache.store(
        fingerprint.clone(),
        ContentTone::Humorous.label(),
        entry("funny"),
    );

    assert!(
        cache
            .lookup(&fingerprint, ContentTone::Professional.label())
            .is_none()
    );
    assert_eq!(
        cache
            .lookup(&fingerprint, ContentTone::Humorous.label())
            .unwrap()
            .generated_text(),
        "funny"
    );
}

#[test]
fn fingerprints_are_independent() {
    let cache = ResultCache::new();
    cache.store(Fingerprint::of(b"first"), "Professional", entry("one"));

    assert!(
        cache
            .lookup(&Fingerprint::of(b"second"), "Professional")
            .is_none()
    );
}

#[test]
fn store_replaces_existing_entry() {
    let cache = ResultCache::new();
    let fingerprint = Fingerprint::of(b"video");

    cache.store(fingerprint.clone(), "Informative", entry("old"));
    cache.store(fingerprint.clone(), "Informative", entry("new"));

    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache
            .lookup(&fingerprint, "Informative")
            .unwrap()
            .generated_text(),
        "new"
    );
}

#[test]
fn earlier_lookups_keep_their_entry_after_replace() {
    let cache = ResultCache::new();
    let fingerprint = Fingerprint::of(b"video");

    cache.store(fingerprint.clone(), "Informative", entry("old"));
    let held = cache.lookup(&fingerprint, "Informative").unwrap();
    cache.store(fingerprint.clone(), "Informative", entry("new"));

    assert_eq!(held.generated_text(), "old");
}

#[test]
fn clear_removes_everything() {
    let cache = ResultCache::new();
    for (index, tone) in ContentTone::ALL.iter().enumerate() {
        cache.store(
            Fingerprint::of(&[index as u8]),
            tone.label(),
            entry(tone.label()),
        );
    }
    assert_eq!(cache.len(), ContentTone::ALL.len());

    cache.clear();

    assert!(cache.is_empty());
    assert!(cache.lookup(&Fingerprint::of(&[0]), "Professional").is_none());
}

#[test]
fn cache_key_equality() {
    let left = CacheKey::new(Fingerprint::of(b"a"), "Professional");
    let right = CacheKey::new(Fingerprint::of(b"a"), "Professional".to_string());
    let other = CacheKey::new(Fingerprint::of(b"a"), "Humorous");

    assert_eq!(left, right);
    assert_ne!(left, other);
}

#[test]
fn concurrent_stores_and_lookups() {
    let cache = Arc::new(ResultCache::new());

    let handles: Vec<_> = (0..8u8)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let fingerprint = Fingerprint::of(&[worker]);
                cache.store(fingerprint.clone(), "Professional", entry("threaded"));
                cache.lookup(&fingerprint, "Professional").is_some()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("Worker panicked"));
    }
    assert_eq!(cache.len(), 8);
}
