//! Authentication endpoints
//!
//! - GET /accounts/login/ - Login form (`?next=`)
//! - POST /accounts/login/ - Check credentials, set the session cookie
//! - POST /accounts/logout/ - End the session

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::common::see_other;
use crate::api::middleware::{ApiError, AppState, AuthenticatedRedactor, LOGIN_URL};
use crate::config::SessionConfig;
use crate::forms::{FormData, FormErrors, FormFields, LoginForm};
use crate::services::ServiceError;

/// Where a successful login lands without a usable `next`
const DEFAULT_REDIRECT: &str = "/";

/// Public routes
pub fn public_router() -> Router<AppState> {
    Router::new().route("/accounts/login/", get(login_form).post(login))
}

/// Routes that need a session
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/accounts/logout/", post(logout))
}

#[derive(Debug, Serialize)]
struct LoginPage {
    next: String,
    fields: &'static [&'static str],
    form: LoginForm,
    errors: FormErrors,
}

/// Only local absolute paths are followed after login
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
}

fn session_cookie(config: &SessionConfig, token: &str, max_age: i64) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| {
        tracing::error!("Invalid session cookie: {}", e);
        ApiError::internal_error("Failed to build session cookie")
    })
}

async fn login_form(Query(query): Query<HashMap<String, String>>) -> Json<LoginPage> {
    Json(LoginPage {
        next: query.get("next").cloned().unwrap_or_default(),
        fields: LoginForm::FIELDS,
        form: LoginForm::default(),
        errors: FormErrors::new(),
    })
}

/// POST /accounts/login/
///
/// `next` is taken from the body, then from the query string.
async fn login(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let data = FormData::from(pairs);
    let form = LoginForm::default().bind(&data);
    let next = data
        .value("next")
        .or_else(|| query.get("next").map(String::as_str))
        .unwrap_or_default()
        .to_string();

    let session = match state.redactor_service.login(&form).await {
        Ok((_, session)) => session,
        Err(ServiceError::Invalid(errors)) => {
            return Ok(Json(LoginPage {
                next,
                fields: LoginForm::FIELDS,
                form,
                errors,
            })
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let max_age = state.redactor_service.session_lifetime().num_seconds();
    let cookie = session_cookie(&state.session_config, &session.id, max_age)?;
    let location = safe_next(Some(next.as_str())).unwrap_or(DEFAULT_REDIRECT);

    let mut response = see_other(location);
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// POST /accounts/logout/
async fn logout(
    State(state): State<AppState>,
    auth: AuthenticatedRedactor,
) -> Result<Response, ApiError> {
    state.redactor_service.logout(&auth.session_id).await?;
    tracing::info!(redactor_id = auth.redactor.id, "Redactor logged out");

    let mut response = see_other(LOGIN_URL);
    response.headers_mut().insert(
        header::SET_COOKIE,
        session_cookie(&state.session_config, "", 0)?,
    );
    Ok(response)
}
