//! Redactor endpoints
//!
//! - GET /redactors/ - Paginated redactor list (`?username=`)
//! - GET /redactors/{id}/ - Redactor with credited newspapers
//! - GET|POST /redactors/create/ - Registration form / submit
//! - GET|POST /redactors/{id}/update/ - Profile form / submit (no password)
//! - GET|POST /redactors/{id}/delete/ - Delete confirmation / submit

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Form, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::common::{
    form_response, outcome, see_other, FormOutcome, ListPage, ListRequest, REDACTOR_LIST,
};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::RedactorFilter;
use crate::forms::{FormData, FormErrors, RedactorCreationForm};
use crate::models::{Redactor, RedactorDetail};

const LIST_URL: &str = "/redactors/";

/// Build the redactors router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/redactors/", get(list_redactors))
        .route("/redactors/create/", get(create_form).post(create_redactor))
        .route("/redactors/{id}/", get(redactor_detail))
        .route("/redactors/{id}/update/", get(update_form).post(update_redactor))
        .route("/redactors/{id}/delete/", get(delete_confirm).post(delete_redactor))
}

/// GET /redactors/ - Redactors ordered by username, 4 per page
async fn list_redactors(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListPage<Redactor>>, ApiError> {
    let request = ListRequest::from_query(REDACTOR_LIST, &query);
    let filter = RedactorFilter {
        username: request.search.clone(),
        ..Default::default()
    };
    let result = state
        .redactor_service
        .list(filter, &request.params)
        .await?;
    Ok(Json(ListPage::new(request, result)))
}

async fn redactor_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RedactorDetail>, ApiError> {
    Ok(Json(state.redactor_service.detail(id).await?))
}

async fn create_form() -> Response {
    form_response(RedactorCreationForm::default(), FormErrors::new())
}

/// POST /redactors/create/ - Registration with a confirmed password
async fn create_redactor(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = RedactorCreationForm::default().bind(&FormData::from(pairs));
    match outcome(state.redactor_service.register(&form).await)? {
        FormOutcome::Saved => Ok(see_other(LIST_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let form = state.redactor_service.info_form(id).await?;
    Ok(form_response(form, FormErrors::new()))
}

/// POST /redactors/{id}/update/
async fn update_redactor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = state
        .redactor_service
        .info_form(id)
        .await?
        .bind(&FormData::from(pairs));
    match outcome(state.redactor_service.update_profile(id, &form).await)? {
        FormOutcome::Saved => Ok(see_other(LIST_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

#[derive(Debug, Serialize)]
struct DeleteConfirmation {
    object: Redactor,
}

async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let object = state.redactor_service.get(id).await?;
    Ok(Json(DeleteConfirmation { object }))
}

/// POST /redactors/{id}/delete/ - Credits and sessions go with the redactor
async fn delete_redactor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.redactor_service.delete(id).await?;
    Ok(see_other(LIST_URL))
}
