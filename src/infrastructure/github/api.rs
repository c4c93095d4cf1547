//! Minimal typed client for the GitHub REST endpoints the capabilities use.

use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

use super::context::RepoContext;

/// Errors from GitHub API requests.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Repository metadata subset.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

/// A file fetched through the contents endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub content: String,
}

impl FileContent {
    /// Decode the base64-encoded file body.
    pub fn decode(&self) -> Result<String, GithubError> {
        let compact: String = self.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|err| GithubError::Decode(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| GithubError::Decode(err.to_string()))
    }
}

/// One code search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub text_matches: Vec<TextMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextMatch {
    #[serde(default)]
    pub fragment: String,
}

/// Code search response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub items: Vec<SearchItem>,
}

/// Client bound to one repository context.
pub struct GithubApiClient {
    http_client: reqwest::Client,
    base_url: String,
    context: RepoContext,
}

impl GithubApiClient {
    pub fn new(context: RepoContext) -> Self {
        Self::with_base_url(context, "https://api.github.com".to_string())
    }

    pub fn with_base_url(context: RepoContext, base_url: String) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent("blueprint-analysis")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url,
            context,
        }
    }

    pub fn repo_slug(&self) -> String {
        self.context.repo.to_string()
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, GithubError> {
        let response = self
            .http_client
            .get(format!("{}{path}", self.base_url))
            .header("Authorization", format!("token {}", self.context.token))
            .header("Accept", "application/vnd.github.v3.text-match+json")
            .send()
            .await
            .map_err(|err| GithubError::Network(err.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(GithubError::Status {
                status,
                path: path.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GithubError> {
        self.get(path)
            .await?
            .json()
            .await
            .map_err(|err| GithubError::Decode(err.to_string()))
    }

    /// Repository metadata.
    pub async fn repo_info(&self) -> Result<RepoInfo, GithubError> {
        self.get_json(&format!("/repos/{}", self.repo_slug())).await
    }

    /// Directory listing; empty path lists the repository root.
    pub async fn list_contents(&self, path: &str) -> Result<Vec<ContentEntry>, GithubError> {
        let path = path.trim_matches('/');
        let url = if path.is_empty() {
            format!("/repos/{}/contents", self.repo_slug())
        } else {
            format!("/repos/{}/contents/{path}", self.repo_slug())
        };
        self.get_json(&url).await
    }

    /// Fetch one file's metadata and body.
    pub async fn file(&self, path: &str) -> Result<FileContent, GithubError> {
        self.get_json(&format!(
            "/repos/{}/contents/{}",
            self.repo_slug(),
            path.trim_start_matches('/')
        ))
        .await
    }

    /// Language byte counts.
    pub async fn languages(&self) -> Result<std::collections::BTreeMap<String, u64>, GithubError> {
        self.get_json(&format!("/repos/{}/languages", self.repo_slug()))
            .await
    }

    /// Search code within the bound repository.
    pub async fn search_code(&self, query: &str) -> Result<SearchResults, GithubError> {
        let scoped = format!("{query} repo:{}", self.repo_slug());
        let encoded = urlencode(&scoped);
        self.get_json(&format!("/search/code?q={encoded}&per_page=10"))
            .await
    }

    /// Whether a file exists at the given path.
    pub async fn file_exists(&self, path: &str) -> bool {
        self.file(path).await.is_ok()
    }
}

/// Percent-encode a query string component.
fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (byte as char).to_string()
            }
            other => format!("%{other:02X}"),
        })
        .collect()
}
