use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use core_lib::{
    sync::{compute_missing, publish_missing, render_digest, PublishReport, Repository},
    AuthError, OAuthProvider,
};
use github::GitHubUserSummary;
use linkedin::{LinkedInProvider, RepositoryPoster};
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::require_token;
use tracing::{info, warn};

use crate::error::{ApiError, Context};
use crate::AppState;

const DEMO_POST_TEXT: &str = "🚀 Hello LinkedIn — posted via my ProjectSync app!";

/// Stand-in post texts for the `/test/sync` comparison.
pub const MOCK_LINKEDIN_POSTS: [&str; 3] =
    ["Portfolio Website", "AI-Chatbot Project", "Hello World Post"];

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncView {
    github_repos: Vec<Repository>,
    linkedin_posts: Vec<String>,
    missing_repos: Vec<Repository>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    missing_repos: Option<Vec<Repository>>,
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn pretty(value: &serde_json::Value) -> Result<String, AuthError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AuthError::ProviderError(format!("Rendering JSON failed: {e}")))
}

pub async fn auth_redirect(State(state): State<Arc<AppState>>) -> Redirect {
    info!("redirecting to LinkedIn authorization");
    Redirect::to(&state.linkedin.auth_url())
}

pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Html<&'static str>, ApiError> {
    if let Some(error) = &query.error {
        tracing::warn!(
            %error,
            description = query.error_description.as_deref().unwrap_or(""),
            "authorization was not granted"
        );
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or(AuthError::MissingAuthorizationCode)
        .context("No authorization code received.")?;

    let token_set = state
        .linkedin
        .exchange_code(&code)
        .await
        .context("Error fetching access token.")?;

    state
        .token_store
        .set(&token_set)
        .await
        .context("Error saving access token.")?;

    Ok(Html(
        r#"<h3>✅ LinkedIn Access Token Saved!</h3>
<a href="/linkedin/profile">➡️ View LinkedIn Profile</a><br>
<a href="/linkedin/post">➡️ Create LinkedIn Post</a>"#,
    ))
}

pub async fn auth_logout(State(state): State<Arc<AppState>>) -> Result<&'static str, ApiError> {
    state
        .token_store
        .clear()
        .await
        .context("Error removing access token.")?;
    Ok("✅ LinkedIn access token removed.")
}

pub async fn linkedin_profile(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    const CONTEXT: &str = "Error fetching profile.";

    let token = require_token(state.token_store.as_ref())
        .await
        .context(CONTEXT)?;
    let profile = state
        .linkedin
        .userinfo(&token.access_token)
        .await
        .context(CONTEXT)?;

    Ok(Html(format!(
        "<h2>✅ LinkedIn Profile Info</h2><pre>{}</pre>",
        escape_html(&pretty(&profile).context(CONTEXT)?)
    )))
}

pub async fn linkedin_post(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    const CONTEXT: &str = "Error creating LinkedIn post.";

    let token = require_token(state.token_store.as_ref())
        .await
        .context(CONTEXT)?;
    let me = state
        .linkedin
        .get_user_info(&token.access_token)
        .await
        .context(CONTEXT)?;
    let post_id = state
        .linkedin
        .publish_post(
            &token.access_token,
            &LinkedInProvider::person_urn(&me.user_id),
            DEMO_POST_TEXT,
        )
        .await
        .context(CONTEXT)?;

    Ok(Html(format!(
        "<h2>✅ Post created successfully!</h2><pre>{}</pre>",
        escape_html(&pretty(&json!({ "id": post_id })).context(CONTEXT)?)
    )))
}

pub async fn github_user(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GitHubUserSummary>, ApiError> {
    let user = state
        .github
        .get_user()
        .await
        .context("Error fetching GitHub data")?;
    Ok(Json(user))
}

pub async fn github_repos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Repository>>, ApiError> {
    let repos = state
        .github
        .list_repositories()
        .await
        .context("Error fetching GitHub repos")?;
    Ok(Json(repos))
}

pub async fn test_sync(State(state): State<Arc<AppState>>) -> Result<Json<SyncView>, ApiError> {
    let github_repos = state
        .github
        .list_repositories()
        .await
        .context("Error in test sync")?;
    let missing_repos = compute_missing(&github_repos, &MOCK_LINKEDIN_POSTS);

    info!(
        repos = github_repos.len(),
        missing = missing_repos.len(),
        "compared repositories with mock posts"
    );

    Ok(Json(SyncView {
        github_repos,
        linkedin_posts: MOCK_LINKEDIN_POSTS.iter().map(|p| p.to_string()).collect(),
        missing_repos,
    }))
}

/// Reads the body as JSON whatever its content type; no body means no repos.
pub async fn test_generate_post(body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        match serde_json::from_slice::<GenerateRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "rejecting generate request body");
                return (StatusCode::BAD_REQUEST, "❌ Invalid JSON body.").into_response();
            }
        }
    };

    match render_digest(request.missing_repos.as_deref().unwrap_or_default()) {
        Some(generated) => Json(json!({ "generatedPost": generated })).into_response(),
        None => "✅ No missing repos to generate post!".into_response(),
    }
}

pub async fn linkedin_post_missing(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    const CONTEXT: &str = "Error posting missing repos to LinkedIn.";

    let token = require_token(state.token_store.as_ref())
        .await
        .context(CONTEXT)?;
    let repos = state
        .github
        .list_repositories()
        .await
        .context(CONTEXT)?;
    let me = state
        .linkedin
        .get_user_info(&token.access_token)
        .await
        .context(CONTEXT)?;
    let author = LinkedInProvider::person_urn(&me.user_id);
    let existing = state
        .linkedin
        .list_post_texts(&token.access_token, &author)
        .await
        .context(CONTEXT)?;

    let poster = RepositoryPoster::new(&state.linkedin, &token.access_token, author);
    let report = publish_missing(&repos, &existing, &poster, &state.shutdown).await;
    let all_published = report.all_published();

    match report {
        PublishReport::NothingToDo => Ok("✅ No missing repos to post!".into_response()),
        PublishReport::Completed(results) => {
            info!(
                count = results.len(),
                all_published, "finished posting missing repos"
            );
            let message = if all_published {
                "✅ All missing GitHub repos posted to LinkedIn."
            } else {
                "⚠️ Some missing GitHub repos were not posted."
            };
            Ok(Json(json!({ "message": message, "results": results })).into_response())
        }
    }
}
