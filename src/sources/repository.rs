//! Repository descriptor and app-name detection.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gh::GhClient;

/// Repository metadata as the dashboard uses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub default_branch: String,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// The repository's page on github.com.
    pub url: String,
    pub owner: String,
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: Option<String>,
    full_name: Option<String>,
    description: Option<String>,
    default_branch: Option<String>,
    language: Option<String>,
    topics: Option<Vec<String>>,
    created_at: Option<String>,
    updated_at: Option<String>,
    html_url: Option<String>,
    owner: Option<ApiOwner>,
    private: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

/// Fetches `repos/{owner}/{repo}`.
///
/// A generic `gh` failure (typically a 404) becomes `RepositoryAccess`;
/// authentication, rate-limit and network failures propagate unchanged.
pub fn repository_info(gh: &GhClient, owner: &str, repo: &str) -> Result<RepositoryInfo> {
    let reference = format!("{}/{}", owner, repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(Error::InvalidRepository { reference });
    }

    let data: Option<ApiRepository> = gh
        .api_json(&format!("repos/{}", reference))
        .map_err(|e| match e {
            Error::GhCommand { .. } => Error::RepositoryAccess {
                repository: reference.clone(),
                message: e.to_string(),
            },
            other => other,
        })?;

    let Some(data) = data else {
        return Err(Error::InvalidRepositoryData {
            repository: reference,
        });
    };
    let Some(name) = data.name.filter(|n| !n.is_empty()) else {
        return Err(Error::InvalidRepositoryData {
            repository: reference,
        });
    };

    Ok(RepositoryInfo {
        name,
        full_name: data.full_name.unwrap_or_else(|| reference.clone()),
        description: data.description.unwrap_or_default(),
        default_branch: data.default_branch.unwrap_or_else(|| "main".to_string()),
        language: data.language,
        topics: data.topics.unwrap_or_default(),
        created_at: data.created_at,
        updated_at: data.updated_at,
        url: data
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}", reference)),
        owner: data
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| owner.to_string()),
        private: data.private.unwrap_or(false),
    })
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<String>,
}

/// Reads a file through the contents API.
fn read_repo_file(gh: &GhClient, owner: &str, repo: &str, path: &str) -> Result<String> {
    let endpoint = format!("repos/{}/{}/contents/{}", owner, repo, path);
    let response: ContentsResponse = gh.api_json(&endpoint)?;
    let encoded: String = response
        .content
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let decode_error = |message: String| Error::JsonParse {
        context: format!("contents of {}", path),
        message,
    };
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| decode_error(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))
}

fn name_from_package_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    ["displayName", "name"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).filter(|n| !n.is_empty()))
        .map(str::to_string)
}

fn name_from_pubspec(text: &str) -> Option<String> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).ok()?;
    value
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn name_from_app_json(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get("expo")
        .and_then(|expo| expo.get("name"))
        .or_else(|| value.get("name"))
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Looks for the app's own name in its manifest files.
///
/// Tries `package.json`, `pubspec.yaml` and `app.json`, in that order.
pub fn detect_app_name(gh: &GhClient, owner: &str, repo: &str) -> Option<String> {
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    let manifests: [(&str, fn(&str) -> Option<String>); 3] = [
        ("package.json", name_from_package_json),
        ("pubspec.yaml", name_from_pubspec),
        ("app.json", name_from_app_json),
    ];

    manifests.iter().find_map(|(path, extract)| {
        match read_repo_file(gh, owner, repo, path) {
            Ok(text) => extract(&text),
            Err(e) => {
                debug!("No {} in {}/{}: {}", path, owner, repo, e);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gh::testing::{fast_client, RoutedRunner};
    use crate::gh::CommandOutput;
    use serde_json::json;

    fn contents(text: &str) -> serde_json::Value {
        json!({ "content": BASE64.encode(text), "encoding": "base64" })
    }

    #[test]
    fn test_repository_info() {
        let runner = RoutedRunner::new().json(
            "api repos/owner/test-repo",
            json!({
                "name": "test-repo",
                "full_name": "owner/test-repo",
                "description": "Test repository",
                "default_branch": "develop",
                "language": "Swift",
                "topics": ["ios", "flutter"],
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2025-01-01T00:00:00Z",
                "html_url": "https://github.com/owner/test-repo",
                "owner": { "login": "owner" },
                "private": false
            }),
        );
        let info = repository_info(&fast_client(runner), "owner", "test-repo").unwrap();

        assert_eq!(info.name, "test-repo");
        assert_eq!(info.full_name, "owner/test-repo");
        assert_eq!(info.default_branch, "develop");
        assert_eq!(info.language.as_deref(), Some("Swift"));
        assert_eq!(info.topics, vec!["ios", "flutter"]);
        assert_eq!(info.url, "https://github.com/owner/test-repo");
        assert_eq!(info.owner, "owner");
    }

    #[test]
    fn test_repository_info_optional_fields() {
        let runner = RoutedRunner::new().json(
            "api repos/owner/test-repo",
            json!({
                "name": "test-repo",
                "full_name": "owner/test-repo",
                "description": null,
                "language": null,
                "topics": null,
                "html_url": "https://github.com/owner/test-repo",
                "owner": { "login": "owner" }
            }),
        );
        let info = repository_info(&fast_client(runner), "owner", "test-repo").unwrap();

        assert_eq!(info.description, "");
        assert_eq!(info.default_branch, "main");
        assert!(info.language.is_none());
        assert!(info.topics.is_empty());
        assert!(!info.private);
    }

    #[test]
    fn test_repository_info_requires_owner_and_repo() {
        let client = fast_client(RoutedRunner::new());
        assert!(matches!(
            repository_info(&client, "", "repo"),
            Err(Error::InvalidRepository { .. })
        ));
        assert!(matches!(
            repository_info(&client, "owner", ""),
            Err(Error::InvalidRepository { .. })
        ));
    }

    #[test]
    fn test_repository_info_without_name() {
        let runner = RoutedRunner::new().json("api repos/owner/test-repo", json!({ "id": 1 }));
        let err = repository_info(&fast_client(runner), "owner", "test-repo").unwrap_err();
        assert!(matches!(err, Error::InvalidRepositoryData { .. }));
        assert!(err.to_string().contains("owner/test-repo"));
    }

    #[test]
    fn test_repository_info_null_response() {
        let runner = RoutedRunner::new().json("api repos/owner/test-repo", json!(null));
        assert!(matches!(
            repository_info(&fast_client(runner), "owner", "test-repo"),
            Err(Error::InvalidRepositoryData { .. })
        ));
    }

    #[test]
    fn test_repository_info_not_found_is_access_error() {
        let err = repository_info(&fast_client(RoutedRunner::new()), "owner", "test-repo")
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to access repository owner/test-repo"));
    }

    #[test]
    fn test_repository_info_not_found_despite_suggestive_names() {
        for name in ["token-vault", "network-monitor"] {
            let runner = RoutedRunner::new().route(
                &format!("api repos/acme/{}", name),
                CommandOutput::failure(
                    1,
                    format!("HTTP 404: Not Found (https://api.github.com/repos/acme/{})", name),
                ),
            );
            let err = repository_info(&fast_client(runner), "acme", name).unwrap_err();
            assert!(matches!(err, Error::RepositoryAccess { .. }), "{}: {:?}", name, err);
            assert!(!err.is_auth());
        }
    }

    #[test]
    fn test_repository_info_auth_failure_propagates() {
        let runner = RoutedRunner::new().route(
            "api repos/owner/test-repo",
            CommandOutput::failure(4, "gh auth login"),
        );
        assert!(matches!(
            repository_info(&fast_client(runner), "owner", "test-repo"),
            Err(Error::GhAuth { .. })
        ));
    }

    #[test]
    fn test_app_name_from_package_json() {
        let runner = RoutedRunner::new().json(
            "api repos/owner/test-repo/contents/package.json",
            contents(r#"{"displayName": "My App", "name": "my-app"}"#),
        );
        let name = detect_app_name(&fast_client(runner), "owner", "test-repo");
        assert_eq!(name.as_deref(), Some("My App"));
    }

    #[test]
    fn test_app_name_from_pubspec() {
        let runner = RoutedRunner::new().json(
            "api repos/owner/test-repo/contents/pubspec.yaml",
            contents("name: flutter_app\nversion: 1.0.0\n"),
        );
        let name = detect_app_name(&fast_client(runner), "owner", "test-repo");
        assert_eq!(name.as_deref(), Some("flutter_app"));
    }

    #[test]
    fn test_app_name_from_app_json() {
        let runner = RoutedRunner::new().json(
            "api repos/owner/test-repo/contents/app.json",
            contents(r#"{"expo": {"name": "Expo App"}}"#),
        );
        let name = detect_app_name(&fast_client(runner), "owner", "test-repo");
        assert_eq!(name.as_deref(), Some("Expo App"));
    }

    #[test]
    fn test_app_name_absent() {
        let client = fast_client(RoutedRunner::new());
        assert!(detect_app_name(&client, "owner", "test-repo").is_none());
        assert!(detect_app_name(&client, "", "repo").is_none());
        assert!(detect_app_name(&client, "owner", "").is_none());
    }

    #[test]
    fn test_contents_with_line_breaks_decode() {
        let encoded = BASE64.encode(r#"{"name": "wrapped"}"#);
        let (head, tail) = encoded.split_at(8);
        let runner = RoutedRunner::new().json(
            "api repos/owner/test-repo/contents/package.json",
            json!({ "content": format!("{}\n{}\n", head, tail) }),
        );
        assert_eq!(
            detect_app_name(&fast_client(runner), "owner", "test-repo").as_deref(),
            Some("wrapped")
        );
    }
}
