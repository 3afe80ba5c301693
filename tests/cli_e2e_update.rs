//! End-to-end tests for the `update` command.
//!
//! The binary runs against a fake `gh` script (see `common::FAKE_GH`), so
//! these tests need neither network access nor GitHub credentials. Store
//! lookups are disabled with `--no-stores`.

#![cfg(unix)]

mod common;
use common::prelude::*;

fn read_json(path: &std::path::Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("apps file should exist");
    serde_json::from_str(&content).expect("apps file should be valid JSON")
}

#[test]
fn test_update_writes_apps_file() {
    let fixture = TestFixture::new()
        .with_config(configs::SINGLE_REPO)
        .with_fake_gh();
    let output = fixture.child("out/apps.json");

    fixture
        .update_command()
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] acme/widget"))
        .stdout(predicate::str::contains("Updated 1 repository"));

    output.assert(predicate::path::exists());
    let doc = read_json(output.path());
    assert_eq!(doc["totalApps"], 1);
    assert!(doc["lastUpdated"].as_str().is_some());

    let app = &doc["apps"][0];
    assert_eq!(app["id"], "widget");
    assert_eq!(app["name"], "Widget");
    assert_eq!(app["repository"], "acme/widget");
    assert_eq!(app["platforms"], serde_json::json!(["ios"]));
    assert_eq!(app["links"]["github"], "https://github.com/acme/widget");
    assert_eq!(app["latestRelease"]["version"], "v1.0.0");
    assert_eq!(app["milestone"]["title"], "v1.1.0");
    assert_eq!(app["milestone"]["progress"], 75);
    assert!(app["milestone"].get("dueOn").is_none());
    assert_eq!(app["recentPRs"][0]["number"], 7);
    assert_eq!(app["recentPRs"][0]["state"], "open");
}

#[test]
fn test_update_partial_failure_keeps_successes() {
    let fixture = TestFixture::new()
        .with_config(configs::ONE_MISSING)
        .with_fake_gh();
    let output = fixture.child("apps.json");

    fixture
        .update_command()
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("[ERR] acme/ghost"))
        .stdout(predicate::str::contains("Updated 1 of 2 repositories"));

    let doc = read_json(output.path());
    assert_eq!(doc["totalApps"], 1);
    assert_eq!(doc["apps"][0]["repository"], "acme/widget");
}

#[test]
fn test_update_malformed_reference_is_reported() {
    let fixture = TestFixture::new()
        .with_config(configs::MALFORMED_REFERENCE)
        .with_fake_gh();
    let output = fixture.child("apps.json");

    fixture
        .update_command()
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid repository format: widget"));

    assert_eq!(read_json(output.path())["totalApps"], 1);
}

#[test]
fn test_update_total_failure_exits_non_zero() {
    let fixture = TestFixture::new()
        .with_config(configs::ALL_MISSING)
        .with_fake_gh();
    let output = fixture.child("apps.json");

    fixture
        .update_command()
        .arg("--output")
        .arg(output.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "No repositories were processed successfully",
        ));

    output.assert(predicate::path::missing());
}

#[test]
fn test_update_backs_up_previous_file() {
    let fixture = TestFixture::new()
        .with_config(configs::SINGLE_REPO)
        .with_fake_gh()
        .with_file("apps.json", "{\"apps\":[],\"lastUpdated\":\"old\",\"totalApps\":0}\n");
    let output = fixture.child("apps.json");

    fixture
        .update_command()
        .arg("--output")
        .arg(output.path())
        .assert()
        .success();

    fixture
        .child("apps.json.backup")
        .assert(predicate::str::contains("\"lastUpdated\":\"old\""));
    fixture.child("apps.json.tmp").assert(predicate::path::missing());
    assert_eq!(read_json(output.path())["totalApps"], 1);
}

#[test]
fn test_update_dry_run_prints_without_writing() {
    let fixture = TestFixture::new()
        .with_config(configs::SINGLE_REPO)
        .with_fake_gh();
    let output = fixture.child("apps.json");

    fixture
        .update_command()
        .arg("--dry-run")
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN]"))
        .stdout(predicate::str::contains("\"totalApps\": 1"));

    output.assert(predicate::path::missing());
}

#[test]
fn test_update_missing_config_fails() {
    let fixture = TestFixture::new().with_fake_gh();

    fixture
        .update_command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_update_config_without_repositories_fails() {
    let fixture = TestFixture::new()
        .with_config(configs::NO_REPOSITORIES)
        .with_fake_gh();

    fixture
        .update_command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("repositories"));
}

#[test]
fn test_update_missing_gh_binary() {
    let fixture = TestFixture::new().with_config(configs::SINGLE_REPO);

    fixture
        .command()
        .arg("update")
        .arg("--no-stores")
        .arg("--gh")
        .arg(fixture.path().join("no-such-gh"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to run gh"));
}

#[test]
fn test_update_uses_env_for_paths() {
    let fixture = TestFixture::new()
        .with_config(configs::SINGLE_REPO)
        .with_fake_gh();

    fixture
        .command()
        .env("APP_DASHBOARD_GH", fixture.gh_path())
        .env("APP_DASHBOARD_OUTPUT", fixture.path().join("env-apps.json"))
        .arg("update")
        .arg("--no-stores")
        .arg("--retry-delay-ms")
        .arg("0")
        .assert()
        .success();

    fixture
        .child("env-apps.json")
        .assert(predicate::path::exists());
}
