use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_lib::AuthError;
use tracing::error;

/// A failed request: what the handler was doing, and why it failed.
///
/// Only `context` reaches the client; the source is logged.
#[derive(Debug)]
pub struct ApiError {
    pub context: &'static str,
    pub source: AuthError,
}

impl ApiError {
    pub fn new(context: &'static str, source: AuthError) -> Self {
        ApiError { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match &self.source {
            AuthError::MissingAuthorizationCode => StatusCode::BAD_REQUEST,
            e if e.needs_authorization() => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self.source, "{}", self.context);

        let message = match &self.source {
            e if e.needs_authorization() => {
                format!("❌ {} Authorize at /auth/linkedin first.", self.context)
            }
            AuthError::RateLimited(_) => {
                format!("❌ {} Upstream rate limit reached, try again later.", self.context)
            }
            _ => format!("❌ {}", self.context),
        };

        (status, message).into_response()
    }
}

/// Attaches a client-facing message to an upstream failure.
pub trait Context<T> {
    fn context(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> Context<T> for Result<T, AuthError> {
    fn context(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::new(context, source))
    }
}
