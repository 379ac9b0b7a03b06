//! Publish / Resolve Properties
//!
//! Sequential version assignment, resolve idempotence and the
//! end-to-end example of the store contract.

use std::fs;

use docvault::store::{ArtifactStore, StoreConfig, StoreError};
use docvault::version::{BumpPolicy, Version, VersionSelector};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn open(temp: &TempDir, policy: BumpPolicy) -> ArtifactStore {
    ArtifactStore::open(StoreConfig::new(temp.path()).with_policy(policy))
        .expect("Failed to open store")
}

fn read(store: &ArtifactStore, selector: VersionSelector) -> Vec<u8> {
    store.resolve(selector).unwrap().read_all().unwrap()
}

fn exact(major: u64, minor: u64, patch: u64) -> VersionSelector {
    VersionSelector::Exact(Version::new(major, minor, patch))
}

// =============================================================================
// Version assignment
// =============================================================================

#[test]
fn test_patch_bump_sequence_from_empty() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp, BumpPolicy::Patch);

    for n in 0..12u64 {
        let receipt = store.publish(format!("doc {}", n).as_bytes()).unwrap();
        assert_eq!(receipt.version, Some(Version::new(1, 0, n)));
    }

    let expected: Vec<_> = (0..12).map(|n| Version::new(1, 0, n)).collect();
    assert_eq!(store.versions(), expected);
}

#[test]
fn test_major_bump_sequence_from_empty() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp, BumpPolicy::Major);

    for n in 1..=6u64 {
        let receipt = store.publish(b"%PDF").unwrap();
        assert_eq!(receipt.version, Some(Version::new(n, 0, 0)));
        assert_eq!(
            receipt.versioned_identifier,
            Some(format!("v-{}.0.0.pdf", n))
        );
    }
}

#[test]
fn test_patch_bump_continues_existing_history() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("v-2.3.9.pdf"), b"old").unwrap();
    fs::write(temp.path().join("v-2.3.10.pdf"), b"older but higher").unwrap();

    let store = open(&temp, BumpPolicy::Patch);
    let receipt = store.publish(b"new").unwrap();

    assert_eq!(receipt.version, Some(Version::new(2, 3, 11)));
}

#[test]
fn test_malformed_names_never_affect_versions() {
    let temp = TempDir::new().unwrap();
    for name in ["notes.txt", "v-1.x.0.pdf", "v-9.9.pdf", "v-50.0.0.docx", "README"] {
        fs::write(temp.path().join(name), b"noise").unwrap();
    }

    let store = open(&temp, BumpPolicy::Patch);
    assert!(store.versions().is_empty());

    assert_eq!(store.publish(b"A").unwrap().version, Some(Version::new(1, 0, 0)));
    assert_eq!(store.publish(b"B").unwrap().version, Some(Version::new(1, 0, 1)));
    assert_eq!(fs::read(temp.path().join("notes.txt")).unwrap(), b"noise");
}

// =============================================================================
// Resolve
// =============================================================================

#[test]
fn test_end_to_end_example() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp, BumpPolicy::Patch);

    assert_eq!(store.publish(b"bytesA").unwrap().version, Some(Version::new(1, 0, 0)));
    assert_eq!(store.publish(b"bytesB").unwrap().version, Some(Version::new(1, 0, 1)));

    assert_eq!(read(&store, VersionSelector::Latest), b"bytesB");
    assert_eq!(read(&store, exact(1, 0, 0)), b"bytesA");
    assert!(matches!(
        store.resolve(exact(9, 9, 9)),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_resolve_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp, BumpPolicy::Patch);
    store.publish(b"first").unwrap();
    store.publish(b"second").unwrap();

    for selector in [VersionSelector::Latest, exact(1, 0, 0), exact(1, 0, 1)] {
        let once = read(&store, selector);
        let twice = read(&store, selector);
        assert_eq!(once, twice, "resolve({}) changed between calls", selector);
    }
}

#[test]
fn test_published_versions_are_immutable() {
    let temp = TempDir::new().unwrap();
    let store = open(&temp, BumpPolicy::Patch);
    store.publish(b"original").unwrap();

    for i in 0..5 {
        store.publish(format!("later {}", i).as_bytes()).unwrap();
    }

    assert_eq!(read(&store, exact(1, 0, 0)), b"original");
}

#[test]
fn test_rejected_payloads_leave_no_trace() {
    let temp = TempDir::new().unwrap();
    let store = ArtifactStore::open(StoreConfig::new(temp.path()).with_max_upload_bytes(8)).unwrap();

    assert!(matches!(store.publish(b""), Err(StoreError::EmptyPayload)));
    assert!(matches!(
        store.publish(b"far too large"),
        Err(StoreError::PayloadTooLarge { .. })
    ));

    assert!(store.versions().is_empty());
    assert!(matches!(
        store.resolve(VersionSelector::Latest),
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.publish(b"fits").unwrap().version, Some(Version::INITIAL));
}

#[test]
fn test_reopened_store_sees_same_history() {
    let temp = TempDir::new().unwrap();
    {
        let store = open(&temp, BumpPolicy::Patch);
        store.publish(b"A").unwrap();
        store.publish(b"B").unwrap();
    }

    let store = open(&temp, BumpPolicy::Patch);
    assert_eq!(read(&store, VersionSelector::Latest), b"B");
    assert_eq!(store.publish(b"C").unwrap().version, Some(Version::new(1, 0, 2)));
}
