//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token validation, redirect to the login page)
//! - Authorization (staff-only administrative console)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::db::repositories::{
    SqlxNewspaperRepository, SqlxRedactorRepository, SqlxSessionRepository, SqlxTopicRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Redactor;
use crate::services::{
    NewspaperService, RedactorService, ServiceError, SessionData, StatsService, TopicService,
};

/// Login page every unauthenticated request is sent to
pub const LOGIN_URL: &str = "/accounts/login/";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub topic_service: Arc<TopicService>,
    pub newspaper_service: Arc<NewspaperService>,
    pub redactor_service: Arc<RedactorService>,
    pub stats_service: Arc<StatsService>,
    pub session_config: Arc<SessionConfig>,
}

impl AppState {
    /// Wire every repository and service onto one pool
    pub fn new(pool: DynDatabasePool, session_config: SessionConfig) -> Self {
        let topics = SqlxTopicRepository::boxed(pool.clone());
        let redactors = SqlxRedactorRepository::boxed(pool.clone());
        let newspapers = SqlxNewspaperRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool);

        let session_data = Arc::new(SessionData::new(sessions.clone()));

        Self {
            topic_service: Arc::new(TopicService::new(topics.clone(), newspapers.clone())),
            newspaper_service: Arc::new(NewspaperService::new(
                newspapers.clone(),
                topics.clone(),
                redactors.clone(),
            )),
            redactor_service: Arc::new(RedactorService::with_session_expiration(
                redactors.clone(),
                sessions,
                newspapers.clone(),
                session_config.expiration_days,
            )),
            stats_service: Arc::new(StatsService::new(topics, redactors, newspapers, session_data)),
            session_config: Arc::new(session_config),
        }
    }
}

/// Authenticated redactor and the session that identified them
#[derive(Debug, Clone)]
pub struct AuthenticatedRedactor {
    pub redactor: Redactor,
    pub session_id: String,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => ApiError::not_found(err.to_string()),
            ServiceError::Protected(message) => ApiError::conflict(message),
            // Handlers render form errors themselves; reaching here is a bug
            ServiceError::Invalid(errors) => ApiError::with_details(
                "VALIDATION_ERROR",
                "Invalid form data",
                serde_json::to_value(&errors).unwrap_or_default(),
            ),
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract session token from the `Authorization: Bearer` header or the
/// `session` cookie
pub fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Login URL that brings the caller back to `path_and_query` afterwards
pub fn login_redirect(path_and_query: &str) -> Redirect {
    Redirect::to(&format!(
        "{}?next={}",
        LOGIN_URL,
        urlencoding::encode(path_and_query)
    ))
}

/// Authentication middleware.
///
/// Requests without a live session are redirected to the login page.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let Some(token) = extract_session_token(request.headers()) else {
        return Ok(login_redirect(&path_and_query).into_response());
    };

    let Some(redactor) = state.redactor_service.validate_session(&token).await? else {
        tracing::debug!("Rejected unknown or expired session");
        return Ok(login_redirect(&path_and_query).into_response());
    };

    request.extensions_mut().insert(AuthenticatedRedactor {
        redactor,
        session_id: token,
    });
    Ok(next.run(request).await)
}

/// Staff authorization middleware, layered inside [`require_auth`]
pub async fn require_staff(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthenticatedRedactor>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !auth.redactor.can_access_admin() {
        return Err(ApiError::forbidden("Staff privileges required"));
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedRedactor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedRedactor>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_extract_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=xyz"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("xyz"));

        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(extract_session_token(&headers), None);
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_login_redirect_keeps_query() {
        let response = login_redirect("/topics/?name=polit").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/accounts/login/?next=%2Ftopics%2F%3Fname%3Dpolit"
        );
    }

    #[test]
    fn test_service_error_mapping() {
        let not_found = ApiError::from(ServiceError::NotFound {
            entity: "Topic",
            id: 3,
        });
        assert_eq!(not_found.error.code, "NOT_FOUND");
        assert_eq!(not_found.error.message, "Topic not found: 3");

        let conflict = ApiError::from(ServiceError::Protected("in use".into()));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let internal = ApiError::from(ServiceError::Internal(anyhow::anyhow!("db down")));
        assert_eq!(internal.error.message, "Internal server error");
    }
}
