use core_lib::{sync::Repository, AuthError};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "projectsync";

#[derive(Deserialize, Debug)]
struct GitHubUser {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    public_repos: u64,
    followers: u64,
    following: u64,
    html_url: String,
}

#[derive(Deserialize, Debug)]
struct GitHubRepo {
    name: String,
    html_url: String,
    description: Option<String>,
}

/// The public profile fields the server exposes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GitHubUserSummary {
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub profile_url: String,
}

impl From<GitHubUser> for GitHubUserSummary {
    fn from(user: GitHubUser) -> Self {
        GitHubUserSummary {
            username: user.login,
            name: user.name,
            bio: user.bio,
            public_repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            profile_url: user.html_url,
        }
    }
}

/// Reads a single user's profile and repositories with a personal access token.
pub struct GitHubProvider {
    username: String,
    token: String,
    api_base: String,
    client: Client,
}

impl GitHubProvider {
    pub fn new(username: String, token: String) -> Self {
        GitHubProvider {
            username,
            token,
            api_base: GITHUB_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Points the provider at another API root, e.g. a GitHub Enterprise host or a test server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn get(&self, path: &str) -> Result<Response, AuthError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%url, "GitHub request");

        let res = self
            .client
            .get(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AuthError::ProviderError(format!("GitHub API request failed: {e}")))?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        warn!(%url, status = status.as_u16(), "GitHub API returned an error");
        Err(AuthError::from_status(status.as_u16(), &body))
    }

    pub async fn get_user(&self) -> Result<GitHubUserSummary, AuthError> {
        let user: GitHubUser = self
            .get(&format!("/users/{}", self.username))
            .await?
            .json()
            .await
            .map_err(|e| AuthError::ProviderError(format!("Error parsing GitHub user: {e}")))?;

        Ok(user.into())
    }

    pub async fn list_repositories(&self) -> Result<Vec<Repository>, AuthError> {
        let repos: Vec<GitHubRepo> = self
            .get(&format!("/users/{}/repos", self.username))
            .await?
            .json()
            .await
            .map_err(|e| AuthError::ProviderError(format!("Error parsing GitHub repos: {e}")))?;

        debug!(count = repos.len(), user = %self.username, "listed repositories");

        Ok(repos
            .into_iter()
            .map(|repo| Repository {
                name: repo.name,
                url: repo.html_url,
                description: repo.description,
            })
            .collect())
    }
}
