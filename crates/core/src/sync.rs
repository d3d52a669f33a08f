//! Repository to post reconciliation.
//!
//! A repository counts as already announced when any existing post text
//! contains its name verbatim (case-sensitive). Short names can therefore be
//! matched by unrelated posts ("AI" inside "MAIN"); that is accepted.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::AuthError;

/// A repository as listed by the source hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Repository {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        description: Option<impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: description.map(Into::into),
        }
    }
}

/// Returns the repositories whose name appears in none of the post texts,
/// in their original order.
pub fn compute_missing<S: AsRef<str>>(
    repositories: &[Repository],
    existing_post_texts: &[S],
) -> Vec<Repository> {
    repositories
        .iter()
        .filter(|repo| {
            !existing_post_texts
                .iter()
                .any(|text| text.as_ref().contains(repo.name.as_str()))
        })
        .cloned()
        .collect()
}

/// Post text announcing a single repository.
pub fn render_post(repository: &Repository) -> String {
    format!(
        "🚀 Check out my GitHub project \"{}\"! {} GitHub: {}",
        repository.name,
        repository.description.as_deref().unwrap_or(""),
        repository.url
    )
}

/// One combined announcement for several repositories, `None` when there is
/// nothing to announce.
pub fn render_digest(repositories: &[Repository]) -> Option<String> {
    if repositories.is_empty() {
        return None;
    }
    let names = repositories
        .iter()
        .map(|repo| repo.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("Check out these amazing projects: {names}. 🚀"))
}

/// Publishes one post for a repository and returns the upstream post id.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RepositoryPublisher: Send + Sync {
    async fn publish(&self, repository: &Repository) -> Result<String, AuthError>;
}

/// Result of publishing a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PublishOutcome {
    Published { post_id: String },
    Failed { error: String },
    RateLimited { error: String },
    /// Not attempted, because of cancellation or an earlier rate limit.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRecord {
    pub repo: String,
    #[serde(flatten)]
    pub outcome: PublishOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReport {
    /// Every repository is already covered by a post; no publish call was made.
    NothingToDo,
    /// One record per missing repository, in order.
    Completed(Vec<PublishRecord>),
}

impl PublishReport {
    pub fn all_published(&self) -> bool {
        match self {
            PublishReport::NothingToDo => true,
            PublishReport::Completed(records) => records
                .iter()
                .all(|r| matches!(r.outcome, PublishOutcome::Published { .. })),
        }
    }
}

/// Publishes a post for every missing repository, one call at a time.
///
/// A failing item does not abort the batch. A rate limit or a cancelled
/// `cancel` token stops further calls and marks the rest as skipped.
pub async fn publish_missing<S, P>(
    repositories: &[Repository],
    existing_post_texts: &[S],
    publisher: &P,
    cancel: &CancellationToken,
) -> PublishReport
where
    S: AsRef<str>,
    P: RepositoryPublisher + ?Sized,
{
    let missing = compute_missing(repositories, existing_post_texts);
    if missing.is_empty() {
        debug!(repositories = repositories.len(), "no missing repositories");
        return PublishReport::NothingToDo;
    }

    let mut records = Vec::with_capacity(missing.len());
    let mut halted = false;

    for repo in missing {
        if halted || cancel.is_cancelled() {
            records.push(PublishRecord {
                repo: repo.name,
                outcome: PublishOutcome::Skipped,
            });
            continue;
        }

        let outcome = match publisher.publish(&repo).await {
            Ok(post_id) => {
                info!(repo = %repo.name, %post_id, "published repository post");
                PublishOutcome::Published { post_id }
            }
            Err(AuthError::RateLimited(error)) => {
                warn!(repo = %repo.name, %error, "rate limited, skipping remaining repositories");
                halted = true;
                PublishOutcome::RateLimited { error }
            }
            Err(err) => {
                warn!(repo = %repo.name, error = %err, "failed to publish repository post");
                PublishOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        records.push(PublishRecord {
            repo: repo.name,
            outcome,
        });
    }

    PublishReport::Completed(records)
}
