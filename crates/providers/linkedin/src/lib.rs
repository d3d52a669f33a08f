use core_lib::{
    sync::{render_post, Repository, RepositoryPublisher},
    token::TokenSet,
    AuthError, OAuthProvider, UserInfo,
};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::form_urlencoded;

const LINKEDIN_AUTH_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const LINKEDIN_TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const LINKEDIN_API_URL: &str = "https://api.linkedin.com";

const SCOPE: &str = "openid profile email w_member_social";
const RESTLI_VERSION: &str = "2.0.0";

/// Where the provider sends its requests. Defaults to the public LinkedIn hosts.
#[derive(Debug, Clone)]
pub struct LinkedInEndpoints {
    pub authorization: String,
    pub token: String,
    pub api_base: String,
}

impl Default for LinkedInEndpoints {
    fn default() -> Self {
        LinkedInEndpoints {
            authorization: LINKEDIN_AUTH_URL.to_string(),
            token: LINKEDIN_TOKEN_URL.to_string(),
            api_base: LINKEDIN_API_URL.to_string(),
        }
    }
}

impl LinkedInEndpoints {
    /// Every endpoint served from one root, the layout used by test servers.
    pub fn single_host(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        LinkedInEndpoints {
            authorization: format!("{base}/oauth/v2/authorization"),
            token: format!("{base}/oauth/v2/accessToken"),
            api_base: base.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct LinkedInTokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LinkedInUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize, Debug)]
struct UgcPostList {
    #[serde(default)]
    elements: Vec<UgcPost>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UgcPost {
    specific_content: Option<SpecificContent>,
}

#[derive(Deserialize, Debug)]
struct SpecificContent {
    #[serde(rename = "com.linkedin.ugc.ShareContent")]
    share_content: Option<ShareContent>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ShareContent {
    share_commentary: Option<ShareCommentary>,
}

#[derive(Deserialize, Debug)]
struct ShareCommentary {
    text: Option<String>,
}

impl UgcPost {
    fn into_text(self) -> Option<String> {
        self.specific_content?
            .share_content?
            .share_commentary?
            .text
    }
}

pub struct LinkedInProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: LinkedInEndpoints,
    client: Client,
}

impl LinkedInProvider {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        LinkedInProvider {
            client_id,
            client_secret,
            redirect_uri,
            endpoints: LinkedInEndpoints::default(),
            client: Client::new(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: LinkedInEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The member URN LinkedIn expects as a post author.
    pub fn person_urn(sub: &str) -> String {
        format!("urn:li:person:{sub}")
    }

    async fn check(res: Response, what: &str) -> Result<Response, AuthError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "LinkedIn {what} returned an error");
        Err(AuthError::from_status(status.as_u16(), &body))
    }

    /// Raw OpenID userinfo document for the token's member.
    pub async fn userinfo(&self, access_token: &str) -> Result<Value, AuthError> {
        let url = format!("{}/v2/userinfo", self.endpoints.api_base);
        debug!(%url, "LinkedIn userinfo request");

        let res = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderError(format!("LinkedIn API request failed: {e}")))?;

        Self::check(res, "userinfo")
            .await?
            .json()
            .await
            .map_err(|e| AuthError::ProviderError(format!("Error parsing user info: {e}")))
    }

    /// Publishes a public text post and returns its id.
    pub async fn publish_post(
        &self,
        access_token: &str,
        author_urn: &str,
        text: &str,
    ) -> Result<String, AuthError> {
        let url = format!("{}/v2/ugcPosts", self.endpoints.api_base);
        let payload = json!({
            "author": author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": text },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::ProviderError(format!("LinkedIn API request failed: {e}")))?;

        let res = Self::check(res, "ugcPosts create").await?;

        let header_id = res
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = res
            .text()
            .await
            .map_err(|e| AuthError::ProviderError(format!("Error reading post response: {e}")))?;

        let body_id = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string));

        let post_id = body_id.or(header_id).ok_or_else(|| {
            AuthError::ProviderError("Post created but no id was returned".to_string())
        })?;

        info!(%post_id, "published LinkedIn post");
        Ok(post_id)
    }

    /// Commentary texts of the author's existing posts. Posts without text are skipped.
    pub async fn list_post_texts(
        &self,
        access_token: &str,
        author_urn: &str,
    ) -> Result<Vec<String>, AuthError> {
        let encoded_urn: String = form_urlencoded::byte_serialize(author_urn.as_bytes()).collect();
        let url = format!(
            "{}/v2/ugcPosts?q=authors&authors=List({encoded_urn})",
            self.endpoints.api_base
        );
        debug!(%url, "LinkedIn ugcPosts request");

        let res = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .send()
            .await
            .map_err(|e| AuthError::ProviderError(format!("LinkedIn API request failed: {e}")))?;

        let posts: UgcPostList = Self::check(res, "ugcPosts list")
            .await?
            .json()
            .await
            .map_err(|e| AuthError::ProviderError(format!("Error parsing posts: {e}")))?;

        Ok(posts
            .elements
            .into_iter()
            .filter_map(UgcPost::into_text)
            .collect())
    }
}

#[async_trait::async_trait]
impl OAuthProvider for LinkedInProvider {
    fn auth_url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", SCOPE)
            .finish()
            // form encoding writes spaces as '+' (a literal '+' is already %2B)
            .replace('+', "%20");
        format!("{}?{}", self.endpoints.authorization, query)
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, AuthError> {
        if code.is_empty() {
            return Err(AuthError::MissingAuthorizationCode);
        }

        let res = self
            .client
            .post(&self.endpoints.token)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| AuthError::TokenExchangeFailed(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LinkedIn token exchange rejected");
            return Err(match AuthError::from_status(status.as_u16(), &body) {
                AuthError::RateLimited(body) => AuthError::RateLimited(body),
                other => AuthError::TokenExchangeFailed(other.to_string()),
            });
        }

        let token_response: LinkedInTokenResponse = res
            .json()
            .await
            .map_err(|err| AuthError::TokenExchangeFailed(err.to_string()))?;

        info!(
            expires_in = ?token_response.expires_in,
            "exchanged authorization code for access token"
        );

        Ok(TokenSet::from_grant(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        ))
    }

    async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let raw = self.userinfo(access_token).await?;
        let user_info: LinkedInUserInfo = serde_json::from_value(raw)
            .map_err(|e| AuthError::ProviderError(format!("Error parsing user info: {e}")))?;

        Ok(UserInfo {
            username: user_info.name.unwrap_or_else(|| user_info.sub.clone()),
            user_id: user_info.sub,
            email: user_info.email,
        })
    }
}

/// Announces repositories as posts by one member.
pub struct RepositoryPoster<'a> {
    provider: &'a LinkedInProvider,
    access_token: &'a str,
    author_urn: String,
}

impl<'a> RepositoryPoster<'a> {
    pub fn new(provider: &'a LinkedInProvider, access_token: &'a str, author_urn: String) -> Self {
        RepositoryPoster {
            provider,
            access_token,
            author_urn,
        }
    }
}

#[async_trait::async_trait]
impl RepositoryPublisher for RepositoryPoster<'_> {
    async fn publish(&self, repository: &Repository) -> Result<String, AuthError> {
        self.provider
            .publish_post(self.access_token, &self.author_urn, &render_post(repository))
            .await
    }
}
