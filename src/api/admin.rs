//! Administrative console endpoints (staff only)
//!
//! Raw CRUD over every entity:
//! - GET /admin/ - Model index with counts
//! - GET /admin/{model}/ - Changelist (`?q=`, 100 per page)
//! - GET|POST /admin/{model}/add/ - Add form / submit
//! - GET|POST /admin/{model}/{id}/change/ - Change form / submit
//! - POST /admin/{model}/{id}/delete/ - Delete
//!
//! The redactor change page edits `years_of_experience` and the staff flags.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::common::{
    form_response, form_response_with_choices, outcome, see_other, FormOutcome, ListPage,
    ListRequest, ADMIN_LIST,
};
use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::{NewspaperFilter, RedactorFilter};
use crate::forms::{
    parse_id, AdminRedactorForm, FormData, FormErrors, FormFields, NewspaperForm,
    RedactorCreationForm, TopicForm,
};
use crate::models::{NewspaperWithTopic, Redactor, Topic};

const TOPICS_URL: &str = "/admin/topics/";
const NEWSPAPERS_URL: &str = "/admin/newspapers/";
const REDACTORS_URL: &str = "/admin/redactors/";

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(admin_index))
        // Topics
        .route("/admin/topics/", get(list_topics))
        .route("/admin/topics/add/", get(add_topic_form).post(add_topic))
        .route("/admin/topics/{id}/change/", get(change_topic_form).post(change_topic))
        .route("/admin/topics/{id}/delete/", post(delete_topic))
        // Newspapers
        .route("/admin/newspapers/", get(list_newspapers))
        .route("/admin/newspapers/add/", get(add_newspaper_form).post(add_newspaper))
        .route(
            "/admin/newspapers/{id}/change/",
            get(change_newspaper_form).post(change_newspaper),
        )
        .route("/admin/newspapers/{id}/delete/", post(delete_newspaper))
        // Redactors
        .route("/admin/redactors/", get(list_redactors))
        .route("/admin/redactors/add/", get(add_redactor_form).post(add_redactor))
        .route(
            "/admin/redactors/{id}/change/",
            get(change_redactor_form).post(change_redactor),
        )
        .route("/admin/redactors/{id}/delete/", post(delete_redactor))
}

// ============================================================================
// Index
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ModelEntry {
    pub name: &'static str,
    pub url: &'static str,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminIndexResponse {
    pub models: Vec<ModelEntry>,
}

/// GET /admin/
async fn admin_index(State(state): State<AppState>) -> Result<Json<AdminIndexResponse>, ApiError> {
    let models = vec![
        ModelEntry {
            name: "newspapers",
            url: NEWSPAPERS_URL,
            count: state.newspaper_service.count().await?,
        },
        ModelEntry {
            name: "redactors",
            url: REDACTORS_URL,
            count: state.redactor_service.count().await?,
        },
        ModelEntry {
            name: "topics",
            url: TOPICS_URL,
            count: state.topic_service.count().await?,
        },
    ];
    Ok(Json(AdminIndexResponse { models }))
}

// ============================================================================
// Topics
// ============================================================================

async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListPage<Topic>>, ApiError> {
    let request = ListRequest::from_query(ADMIN_LIST, &query);
    let result = state
        .topic_service
        .list(request.search.clone(), &request.params)
        .await?;
    Ok(Json(ListPage::new(request, result)))
}

async fn add_topic_form() -> Response {
    form_response(TopicForm::default(), FormErrors::new())
}

async fn add_topic(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = TopicForm::default().bind(&FormData::from(pairs));
    match outcome(state.topic_service.create(&form).await)? {
        FormOutcome::Saved => Ok(see_other(TOPICS_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

async fn change_topic_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let form = state.topic_service.edit_form(id).await?;
    Ok(form_response(form, FormErrors::new()))
}

async fn change_topic(
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
        FormOutcome::Saved => Ok(see_other(TOPICS_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.topic_service.delete(id).await?;
    Ok(see_other(TOPICS_URL))
}

// ============================================================================
// Newspapers
// ============================================================================

/// Title search plus an optional `?topic=<id>` filter
async fn list_newspapers(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListPage<NewspaperWithTopic>>, ApiError> {
    let request = ListRequest::from_query(ADMIN_LIST, &query);
    let filter = NewspaperFilter {
        title: request.search.clone(),
        topic_id: query.get("topic").and_then(|raw| parse_id(raw)),
    };
    let result = state
        .newspaper_service
        .list(filter, &request.params)
        .await?;
    Ok(Json(ListPage::new(request, result)))
}

async fn render_newspaper(
    state: &AppState,
    form: NewspaperForm,
    errors: FormErrors,
) -> Result<Response, ApiError> {
    let choices = state.newspaper_service.choices().await?;
    Ok(form_response_with_choices(form, errors, choices))
}

async fn add_newspaper_form(State(state): State<AppState>) -> Result<Response, ApiError> {
    render_newspaper(&state, NewspaperForm::default(), FormErrors::new()).await
}

async fn add_newspaper(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = NewspaperForm::default().bind(&FormData::from(pairs));
    match outcome(state.newspaper_service.create(&form).await)? {
        FormOutcome::Saved => Ok(see_other(NEWSPAPERS_URL)),
        FormOutcome::Invalid(errors) => render_newspaper(&state, form, errors).await,
    }
}

async fn change_newspaper_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let form = state.newspaper_service.edit_form(id).await?;
    render_newspaper(&state, form, FormErrors::new()).await
}

async fn change_newspaper(
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
        FormOutcome::Saved => Ok(see_other(NEWSPAPERS_URL)),
        FormOutcome::Invalid(errors) => render_newspaper(&state, form, errors).await,
    }
}

async fn delete_newspaper(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.newspaper_service.delete(id).await?;
    Ok(see_other(NEWSPAPERS_URL))
}

// ============================================================================
// Redactors
// ============================================================================

/// `q` matches username, first name or last name
async fn list_redactors(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListPage<Redactor>>, ApiError> {
    let request = ListRequest::from_query(ADMIN_LIST, &query);
    let filter = RedactorFilter {
        query: request.search.clone(),
        ..Default::default()
    };
    let result = state
        .redactor_service
        .list(filter, &request.params)
        .await?;
    Ok(Json(ListPage::new(request, result)))
}

async fn add_redactor_form() -> Response {
    form_response(RedactorCreationForm::default(), FormErrors::new())
}

async fn add_redactor(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let form = RedactorCreationForm::default().bind(&FormData::from(pairs));
    match outcome(state.redactor_service.register(&form).await)? {
        FormOutcome::Saved => Ok(see_other(REDACTORS_URL)),
        FormOutcome::Invalid(errors) => Ok(form_response(form, errors)),
    }
}

/// Change page: the stored redactor next to its editable form
#[derive(Debug, Serialize)]
pub struct RedactorChangePage {
    pub object: Redactor,
    pub fields: &'static [&'static str],
    pub form: AdminRedactorForm,
    pub errors: FormErrors,
}

async fn change_redactor_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RedactorChangePage>, ApiError> {
    let object = state.redactor_service.get(id).await?;
    Ok(Json(RedactorChangePage {
        fields: AdminRedactorForm::FIELDS,
        form: AdminRedactorForm::from_instance(&object),
        object,
        errors: FormErrors::new(),
    }))
}

async fn change_redactor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let object = state.redactor_service.get(id).await?;
    let form = AdminRedactorForm::from_instance(&object).bind(&FormData::from(pairs));
    match outcome(state.redactor_service.admin_update(id, &form).await)? {
        FormOutcome::Saved => Ok(see_other(REDACTORS_URL)),
        FormOutcome::Invalid(errors) => Ok(Json(RedactorChangePage {
            object,
            fields: AdminRedactorForm::FIELDS,
            form,
            errors,
        })
        .into_response()),
    }
}

async fn delete_redactor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.redactor_service.delete(id).await?;
    Ok(see_other(REDACTORS_URL))
}
