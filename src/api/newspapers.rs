//! Newspaper endpoints
//!
//! - GET /newspapers/ - Paginated newspaper list (`?title=`)
//! - GET /newspapers/{id}/ - Newspaper with topic and redactors
//! - GET|POST /newspapers/create/ - Create form / submit
//! - GET|POST /newspapers/{id}/update/ - Update form / submit
//! - GET|POST /newspapers/{id}/delete/ - Delete confirmation / submit
//!
//! Form pages carry the `topic` and `redactors` choices.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Form, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::common::{
    form_response_with_choices, outcome, see_other, FormOutcome, ListPage, ListRequest,
    NEWSPAPER_LIST,
};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::NewspaperFilter;
use crate::forms::{FormData, FormErrors, NewspaperForm};
use crate::models::{NewspaperDetail, NewspaperWithTopic};

const LIST_URL: &str = "/newspapers/";

/// Build the newspapers router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/newspapers/", get(list_newspapers))
        .route("/newspapers/create/", get(create_form).post(create_newspaper))
        .route("/newspapers/{id}/", get(newspaper_detail))
        .route("/newspapers/{id}/update/", get(update_form).post(update_newspaper))
        .route("/newspapers/{id}/delete/", get(delete_confirm).post(delete_newspaper))
}

/// GET /newspapers/ - Newest first, 5 per page, topic joined in
async fn list_newspapers(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListPage<NewspaperWithTopic>>, ApiError> {
    let request = ListRequest::from_query(NEWSPAPER_LIST, &query);
    let filter = NewspaperFilter {
        title: request.search.clone(),
        ..Default::default()
    };
    let result = state
        .newspaper_service
        .list(filter, &request.params)
        .await?;
    Ok(Json(ListPage::new(request, result)))
}

async fn newspaper_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NewspaperDetail>, ApiError> {
    Ok(Json(state.newspaper_service.detail(id).await?))
}

/// Render the form with the current choices
async fn render(
    state: &AppState,
    form: NewspaperForm,
    errors: FormErrors,
) -> Result<Response, ApiError> {
    let choices = state.newspaper_service.choices().await?;
    Ok(form_response_with_choices(form, errors, choices))
}

async fn create_form(State(state): State<AppState>) -> Result<Response, ApiError> {
    render(&state, NewspaperForm::default(), FormErrors::new()).await
}

/// POST /newspapers/create/
async fn create_newspaper(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = NewspaperForm::default().bind(&FormData::from(pairs));
    match outcome(state.newspaper_service.create(&form).await)? {
        FormOutcome::Saved => Ok(see_other(LIST_URL)),
        FormOutcome::Invalid(errors) => render(&state, form, errors).await,
    }
}

async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let form = state.newspaper_service.edit_form(id).await?;
    render(&state, form, FormErrors::new()).await
}

/// POST /newspapers/{id}/update/ - `published_date` is left untouched
async fn update_newspaper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = state
        .newspaper_service
        .edit_form(id)
        .await?
        .bind(&FormData::from(pairs));
    match outcome(state.newspaper_service.update(id, &form).await)? {
        FormOutcome::Saved => Ok(see_other(LIST_URL)),
        FormOutcome::Invalid(errors) => render(&state, form, errors).await,
    }
}

#[derive(Debug, Serialize)]
struct DeleteConfirmation {
    object: NewspaperWithTopic,
}

async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let object = state.newspaper_service.get(id).await?;
    Ok(Json(DeleteConfirmation { object }))
}

/// POST /newspapers/{id}/delete/
async fn delete_newspaper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.newspaper_service.delete(id).await?;
    Ok(see_other(LIST_URL))
}
