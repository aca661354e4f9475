//! Topic endpoints
//!
//! - GET /topics/ - Paginated topic list (`?name=`)
//! - GET|POST /topics/create/ - Create form / submit
//! - GET|POST /topics/{id}/update/ - Update form / submit
//! - GET|POST /topics/{id}/delete/ - Delete confirmation / submit

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Form, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::common::{
    form_response, outcome, see_other, FormOutcome, ListPage, ListRequest, TOPIC_LIST,
};
use crate::api::middleware::{ApiError, AppState};
use crate::forms::{FormData, FormErrors, TopicForm};
use crate::models::{Topic, TopicWithCount};

const LIST_URL: &str = "/topics/";

/// Build the topics router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/topics/", get(list_topics))
        .route("/topics/create/", get(create_form).post(create_topic))
        .route("/topics/{id}/update/", get(update_form).post(update_topic))
        .route("/topics/{id}/delete/", get(delete_confirm).post(delete_topic))
}

/// GET /topics/ - Topics ordered by name, 4 per page
async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListPage<Topic>>, ApiError> {
    let request = ListRequest::from_query(TOPIC_LIST, &query);
    let result = state
        .topic_service
        .list(request.search.clone(), &request.params)
        .await?;
    Ok(Json(ListPage::new(request, result)))
}

async fn create_form() -> Response {
    form_response(TopicForm::default(), FormErrors::new())
}

/// POST /topics/create/
async fn create_topic(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = TopicForm::default().bind(&FormData::from(pairs));
    match outcome(state.topic_service.create(&form).await)? {
        FormOutcome::Saved => Ok(see_other(LIST_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let form = state.topic_service.edit_form(id).await?;
    Ok(form_response(form, FormErrors::new()))
}

/// POST /topics/{id}/update/
async fn update_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = state
        .topic_service
        .edit_form(id)
        .await?
        .bind(&FormData::from(pairs));
    match outcome(state.topic_service.update(id, &form).await)? {
        FormOutcome::Saved => Ok(see_other(LIST_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

#[derive(Debug, Serialize)]
struct DeleteConfirmation {
    object: TopicWithCount,
}

/// GET /topics/{id}/delete/ - The topic and how many newspapers use it
async fn delete_confirm(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let object = state.topic_service.get_with_count(id).await?;
    Ok(Json(DeleteConfirmation { object }))
}

/// POST /topics/{id}/delete/
///
/// Topics still referenced by newspapers are kept and a 409 is returned.
async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.topic_service.delete(id).await?;
    Ok(see_other(LIST_URL))
}
