use cicomp::core::ComponentError;
use cicomp::fetch::FetchOptions;
use cicomp::project::User;
use cicomp::resolver::ResolutionMode;
use cicomp::test_utils::{TestBackend, init_test_logging};

use crate::common::{address, backend_service, index_service};

fn alice() -> User {
    User::new("alice")
}

fn mode(mode: ResolutionMode) -> FetchOptions {
    FetchOptions {
        mode,
        ..FetchOptions::default()
    }
}

fn resolved_sha(path: &str, resolution: ResolutionMode) -> String {
    index_service()
        .resolve(&address(path), &alice(), mode(resolution))
        .unwrap()
        .resolved
        .content_sha
}

#[test]
fn test_catalog_table_in_both_modes() {
    init_test_logging(None);

    for resolution in [ResolutionMode::Optimized, ResolutionMode::Legacy] {
        assert_eq!(resolved_sha("acme/ci/lint@1", resolution), "sha-123");
        assert_eq!(resolved_sha("acme/ci/lint@1.2", resolution), "sha-123");
        assert_eq!(resolved_sha("acme/ci/lint@1.0", resolution), "sha-100");
        assert_eq!(resolved_sha("acme/ci/lint@2", resolution), "sha-200b");
        assert_eq!(resolved_sha("acme/ci/lint@~latest", resolution), "sha-200b");
    }
}

#[test]
fn test_exact_version_name_diverges_between_modes() {
    assert_eq!(resolved_sha("acme/ci/lint@stable", ResolutionMode::Optimized), "sha-stable");
    assert_eq!(resolved_sha("acme/ci/lint@stable", ResolutionMode::Legacy), "sha-stable-branch");

    let legacy = index_service()
        .resolve(&address("acme/ci/lint@1.2.3"), &alice(), mode(ResolutionMode::Legacy))
        .unwrap_err();
    assert!(matches!(legacy, ComponentError::Unresolved { .. }));
    assert_eq!(resolved_sha("acme/ci/lint@1.2.3", ResolutionMode::Optimized), "sha-123");
}

#[test]
fn test_matched_semver_only_on_catalog_path() {
    let service = index_service();

    let catalog = service
        .resolve(&address("acme/ci/lint@1"), &alice(), FetchOptions::default())
        .unwrap();
    assert_eq!(catalog.resolved.matched_semver.as_deref(), Some("1.2.3"));

    let release = service
        .resolve(&address("acme/ci/lint@v0.9.0"), &alice(), FetchOptions::default())
        .unwrap();
    assert_eq!(release.resolved.content_sha, "sha-090");
    assert_eq!(release.resolved.matched_semver, None);

    let branch = service
        .resolve(&address("acme/ci/lint@main"), &alice(), FetchOptions::default())
        .unwrap();
    assert_eq!(branch.resolved.content_sha, "sha-main");
    assert_eq!(branch.resolved.matched_semver, None);
}

#[test]
fn test_project_without_catalog() {
    let service = index_service();
    let anyone = User::new("bob");

    let release = service
        .resolve(&address("acme/plain/build@1.2.3"), &anyone, FetchOptions::default())
        .unwrap();
    assert_eq!(release.resolved.content_sha, "sha-rel");
    assert_eq!(release.resolved.matched_semver, None);

    let latest = service
        .resolve(&address("acme/plain/build@~latest"), &anyone, FetchOptions::default())
        .unwrap_err();
    assert!(matches!(latest, ComponentError::InvalidLatestUsage { .. }));

    let shorthand = service
        .resolve(&address("acme/plain/build@1"), &anyone, FetchOptions::default())
        .unwrap_err();
    assert!(matches!(shorthand, ComponentError::InvalidPartialSemverUsage { .. }));
}

#[test]
fn test_address_errors() {
    let service = index_service();

    let foreign = service
        .resolve("github.com/acme/ci/lint@1", &alice(), FetchOptions::default())
        .unwrap_err();
    assert!(matches!(foreign, ComponentError::NotInstanceAddress { .. }));

    let malformed = service
        .resolve(&address("lint@1"), &alice(), FetchOptions::default())
        .unwrap_err();
    assert!(matches!(malformed, ComponentError::MalformedAddress { .. }));

    let missing = service
        .resolve(&address("acme/gone/lint@1"), &alice(), FetchOptions::default())
        .unwrap_err();
    assert!(matches!(missing, ComponentError::ProjectNotFound { .. }));
}

#[test]
fn test_redirected_project_resolves_under_new_path() {
    let resolved = index_service()
        .resolve(&address("acme/old-ci/lint@1"), &alice(), FetchOptions::default())
        .unwrap();
    assert_eq!(resolved.project, "acme/ci");
    assert_eq!(resolved.resolved.content_sha, "sha-123");
}

#[test]
fn test_denied_user_triggers_no_reads() {
    let backend = TestBackend::new()
        .catalog_project("acme/ci")
        .version("acme/ci", "1.0.0", "sha-100")
        .file("sha-100", "lint", "lint: {}\n")
        .reader("acme/ci", "alice");
    let service = backend_service(backend);

    for token in ["~latest", "1", "1.0.0", "main"] {
        let err = service
            .fetch(
                &address(&format!("acme/ci/lint@{token}")),
                &User::new("mallory"),
                FetchOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ComponentError::AccessDenied { .. }));
    }
    assert_eq!(service.backend().reads(), 0);
}

#[test]
fn test_resolution_is_deterministic() {
    let service = index_service();
    for path in [
        "acme/ci/lint@~latest",
        "acme/ci/lint@1",
        "acme/ci/lint@stable",
        "acme/ci/lint@main",
    ] {
        let first = service.resolve(&address(path), &alice(), FetchOptions::default()).unwrap();
        for _ in 0..5 {
            let again = service.resolve(&address(path), &alice(), FetchOptions::default());
            assert_eq!(again.unwrap(), first);
        }
    }
}

#[test]
fn test_unresolved_suggests_close_versions() {
    let err = index_service()
        .resolve(&address("acme/ci/lint@1.2.4"), &alice(), FetchOptions::default())
        .unwrap_err();
    match err {
        ComponentError::Unresolved { suggestions, .. } => {
            assert!(suggestions.contains(&"1.2.3".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}
