//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::SINGLE_REPO);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```
//!
//! The `update` tests never talk to GitHub: [`TestFixture::with_fake_gh`]
//! writes a shell script that answers a fixed set of `gh` invocations, and the
//! command is pointed at it with `--gh`.

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Configuration files used across tests.
#[allow(dead_code)]
pub mod configs {
    /// One repository that the fake `gh` knows about.
    pub const SINGLE_REPO: &str = r#"{
  "repositories": [
    { "id": "widget", "name": "Widget", "repository": "acme/widget", "platforms": ["ios"] }
  ]
}"#;

    /// One known repository and one the fake `gh` answers with a 404.
    pub const ONE_MISSING: &str = r#"{
  "repositories": [
    { "repository": "acme/widget" },
    { "repository": "acme/ghost" }
  ]
}"#;

    /// Only repositories the fake `gh` answers with a 404.
    pub const ALL_MISSING: &str = r#"{
  "repositories": [
    { "repository": "acme/ghost" },
    { "repository": "acme/phantom" }
  ]
}"#;

    /// A reference without an owner.
    pub const MALFORMED_REFERENCE: &str = r#"{
  "repositories": [
    { "repository": "acme/widget" },
    { "name": "Broken", "repository": "widget" }
  ]
}"#;

    /// Valid JSON without the `repositories` array.
    pub const NO_REPOSITORIES: &str = r#"{ "apps": [] }"#;

    /// Not JSON at all.
    pub const INVALID_JSON: &str = "{ repositories: [";
}

/// Shell script standing in for `gh`.
///
/// It serves `acme/widget` (repository, one milestone, one release and one
/// open pull request) and fails every other call the way `gh` does for a
/// missing resource.
#[allow(dead_code)]
pub const FAKE_GH: &str = r#"#!/bin/sh
case "$*" in
  "api repos/acme/widget")
    cat <<'EOF'
{"name":"widget","full_name":"acme/widget","description":"A widget","default_branch":"main","language":"Rust","topics":["cli"],"html_url":"https://github.com/acme/widget","owner":{"login":"acme"},"private":false,"updated_at":"2024-05-01T00:00:00Z"}
EOF
    ;;
  "api repos/acme/widget/milestones")
    cat <<'EOF'
[{"title":"v1.1.0","state":"open","open_issues":1,"closed_issues":3,"due_on":"2024-06-30T07:00:00Z","html_url":"https://github.com/acme/widget/milestone/2"}]
EOF
    ;;
  "release view --repo acme/widget"*)
    cat <<'EOF'
{"tagName":"v1.0.0","publishedAt":"2024-04-01T12:00:00Z","url":"https://github.com/acme/widget/releases/tag/v1.0.0","isPrerelease":false}
EOF
    ;;
  "pr list --repo acme/widget --state open"*)
    cat <<'EOF'
[{"number":7,"title":"Add dark mode","url":"https://github.com/acme/widget/pull/7","state":"OPEN","mergedAt":null,"closedAt":null,"updatedAt":"2024-05-02T09:30:00Z"}]
EOF
    ;;
  "pr list --repo acme/widget"*)
    echo '[]'
    ;;
  *)
    echo "HTTP 404: Not Found" >&2
    exit 1
    ;;
esac
"#;

/// A test fixture that provides a temporary directory with optional config.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `config.json` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("config.json")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Install [`FAKE_GH`] as an executable `gh` in the fixture.
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn with_fake_gh(self) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let script = self.temp_dir.child("gh");
        script.write_str(FAKE_GH).expect("Failed to write fake gh");
        std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake gh executable");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.json")
    }

    /// Get the path to the fake `gh` script.
    #[allow(dead_code)]
    pub fn gh_path(&self) -> PathBuf {
        self.temp_dir.path().join("gh")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    ///
    /// The `APP_DASHBOARD_*` variables are cleared so the caller's
    /// environment cannot change the defaults under test.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("app-dashboard");
        cmd.current_dir(self.path())
            .env_remove("APP_DASHBOARD_CONFIG")
            .env_remove("APP_DASHBOARD_OUTPUT")
            .env_remove("APP_DASHBOARD_GH")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// An `update` command wired to the fake `gh`, without retry delays or
    /// store lookups.
    #[allow(dead_code)]
    pub fn update_command(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("update")
            .arg("--gh")
            .arg(self.gh_path())
            .arg("--retry-delay-ms")
            .arg("0")
            .arg("--no-stores");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config(configs::SINGLE_REPO);
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_configs_are_valid_json() {
        for config in [
            configs::SINGLE_REPO,
            configs::ONE_MISSING,
            configs::ALL_MISSING,
            configs::MALFORMED_REFERENCE,
            configs::NO_REPOSITORIES,
        ] {
            serde_json::from_str::<serde_json::Value>(config).expect("Config should be valid JSON");
        }
    }

    #[test]
    fn test_invalid_json_is_actually_invalid() {
        assert!(serde_json::from_str::<serde_json::Value>(configs::INVALID_JSON).is_err());
    }
}
