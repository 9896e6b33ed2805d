use cicomp::core::ComponentError;
use cicomp::fetch::FetchOptions;
use cicomp::project::User;
use cicomp::test_utils::TestBackend;

use crate::common::{address, backend_service};

fn backend() -> TestBackend {
    TestBackend::new()
        .catalog_project("acme/ci")
        .version("acme/ci", "1.2.3", "sha-123")
        .version("acme/ci", "1.3.0", "sha-130")
        .file("sha-123", "lint", "lint: {}\n")
        .file("sha-130", "lint", "lint: { stage: test }\n")
        .reader("acme/ci", "alice")
}

fn uncached() -> FetchOptions {
    FetchOptions {
        cache_enabled: false,
        ..FetchOptions::default()
    }
}

#[test]
fn test_tokens_resolving_to_same_sha_share_an_entry() {
    let service = backend_service(backend());
    let alice = User::new("alice");

    for token in ["1.2.3", "1.2", "1.2.3"] {
        let fetched = service
            .fetch(&address(&format!("acme/ci/lint@{token}")), &alice, FetchOptions::default())
            .unwrap();
        assert_eq!(fetched.sha, "sha-123");
    }

    assert_eq!(service.backend().loads(), 1);
    let stats = service.cache_stats();
    assert_eq!((stats.misses, stats.hits), (1, 2));
}

#[test]
fn test_different_shas_are_cached_separately() {
    let service = backend_service(backend());
    let alice = User::new("alice");

    let old = service.fetch(&address("acme/ci/lint@1.2"), &alice, FetchOptions::default()).unwrap();
    let new = service
        .fetch(&address("acme/ci/lint@~latest"), &alice, FetchOptions::default())
        .unwrap();

    assert_eq!(old.text(), "lint: {}\n");
    assert_eq!(new.text(), "lint: { stage: test }\n");
    assert_eq!(service.backend().loads(), 2);
}

#[test]
fn test_disabled_cache_neither_reads_nor_writes() {
    let service = backend_service(backend());
    let alice = User::new("alice");
    let lint = address("acme/ci/lint@1.2.3");

    service.fetch(&lint, &alice, uncached()).unwrap();
    service.fetch(&lint, &alice, uncached()).unwrap();
    assert_eq!(service.backend().loads(), 2);
    assert_eq!(service.cache_stats().bypasses, 2);

    // Nothing was stored while bypassing.
    service.fetch(&lint, &alice, FetchOptions::default()).unwrap();
    assert_eq!(service.backend().loads(), 3);
    assert_eq!(service.cache_stats().misses, 1);
}

#[test]
fn test_failed_load_is_not_cached() {
    let service = backend_service(backend());
    let alice = User::new("alice");
    let missing = address("acme/ci/deploy@1.2.3");

    for _ in 0..2 {
        let err = service.fetch(&missing, &alice, FetchOptions::default()).unwrap_err();
        assert!(matches!(err, ComponentError::Loader(_)));
    }
    assert_eq!(service.backend().loads(), 2);
    assert_eq!(service.cache_stats().hits, 0);
}
