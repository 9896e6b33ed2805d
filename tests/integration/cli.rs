use anyhow::Result;
use predicates::prelude::*;
use tokio::fs;

use crate::common::{TestEnv, address};

#[tokio::test]
async fn test_resolve_text_output() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@1"), "--user", "alice", "--index"])
        .arg(&env.index)
        .assert()
        .success()
        .stdout(predicate::str::contains("sha-123"))
        .stdout(predicate::str::contains("catalog version: 1.2.3"))
        .stdout(predicate::str::contains("optimized"));
    Ok(())
}

#[tokio::test]
async fn test_resolve_json_output() -> Result<()> {
    let env = TestEnv::new().await?;

    let output = env
        .cicomp()
        .args(["-q", "resolve", &address("acme/ci/lint@stable")])
        .args(["--user", "alice", "--format", "json"])
        .arg("--index")
        .arg(&env.index)
        .output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["project"], "acme/ci");
    assert_eq!(json["name"], "lint");
    assert_eq!(json["content_sha"], "sha-stable");
    assert_eq!(json["mode"], "optimized");
    Ok(())
}

#[tokio::test]
async fn test_legacy_flag_changes_resolution() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@stable")])
        .args(["--user", "alice", "--legacy", "--index"])
        .arg(&env.index)
        .assert()
        .success()
        .stdout(predicate::str::contains("sha-stable-branch"))
        .stdout(predicate::str::contains("legacy"));
    Ok(())
}

#[tokio::test]
async fn test_config_feature_flag_selects_legacy() -> Result<()> {
    let env = TestEnv::with_config("[features]\noptimized_component_resolution = false\n").await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@1.2.3"), "--user", "alice", "--index"])
        .arg(&env.index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1.2.3"));
    Ok(())
}

#[tokio::test]
async fn test_access_denied_for_anonymous_user() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@1"), "--index"])
        .arg(&env.index)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("acme/ci"))
        .stdout(predicate::str::contains("sha-").not());
    Ok(())
}

#[tokio::test]
async fn test_unresolved_version_shows_suggestion() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@1.2.4"), "--user", "alice", "--index"])
        .arg(&env.index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean"))
        .stderr(predicate::str::contains("1.2.3"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_prints_file_and_context() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["fetch", &address("acme/ci/deploy@1.2.3"), "--user", "alice"])
        .args(["--input", "environment=production", "--index"])
        .arg(&env.index)
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy:"))
        .stdout(predicate::str::contains("# interpolation context"))
        .stdout(predicate::str::contains("\"environment\": \"production\""))
        .stdout(predicate::str::contains("\"replicas\": 1"));
    Ok(())
}

#[tokio::test]
async fn test_fetch_without_header_prints_only_file() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["fetch", &address("acme/plain/build@1.2.3"), "--no-cache", "--index"])
        .arg(&env.index)
        .assert()
        .success()
        .stdout(predicate::str::contains("make"))
        .stdout(predicate::str::contains("interpolation context").not());
    Ok(())
}

#[tokio::test]
async fn test_fetch_rejects_invalid_inputs() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["fetch", &address("acme/ci/deploy@1"), "--user", "alice"])
        .args(["--input", "environment=qa", "--index"])
        .arg(&env.index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("allowed options"));
    Ok(())
}

#[tokio::test]
async fn test_usage_error_on_project_without_catalog() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["resolve", &address("acme/plain/build@~latest"), "--index"])
        .arg(&env.index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("~latest"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_is_reported() -> Result<()> {
    let env = TestEnv::new().await?;
    fs::write(&env.config, "instance_prefix = \"no-slash\"\n").await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@1"), "--index"])
        .arg(&env.index)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must end with '/'"));
    Ok(())
}

#[tokio::test]
async fn test_missing_index_is_reported() -> Result<()> {
    let env = TestEnv::new().await?;

    env.cicomp()
        .args(["resolve", &address("acme/ci/lint@1"), "--index", "does-not-exist.toml"])
        .current_dir(env.dir())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read index"));
    Ok(())
}
