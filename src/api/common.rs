//! Common API utilities and shared types
//!
//! Every entity list handler is a [`ListSpec`] (search parameter and page
//! size) applied to the query string, and every form handler either
//! redirects or renders a [`FormPage`].

use axum::{
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::middleware::ApiError;
use crate::forms::{search_term, FormErrors, FormFields};
use crate::models::{ListParams, PagedResult};
use crate::services::ServiceError;

// ============================================================================
// Lists
// ============================================================================

/// Search parameter and page size of one list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSpec {
    pub search_param: &'static str,
    pub page_size: u32,
}

pub const TOPIC_LIST: ListSpec = ListSpec {
    search_param: "name",
    page_size: 4,
};

pub const NEWSPAPER_LIST: ListSpec = ListSpec {
    search_param: "title",
    page_size: 5,
};

pub const REDACTOR_LIST: ListSpec = ListSpec {
    search_param: "username",
    page_size: 4,
};

/// Administrative changelists search with `q` and show 100 rows
pub const ADMIN_LIST: ListSpec = ListSpec {
    search_param: "q",
    page_size: 100,
};

/// A list request decoded from the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub spec: ListSpec,
    /// Search value exactly as submitted, echoed back to the caller
    pub raw_search: String,
    /// Normalized search term, `None` when no filtering applies
    pub search: Option<String>,
    pub params: ListParams,
}

impl ListRequest {
    pub fn from_query(spec: ListSpec, query: &HashMap<String, String>) -> Self {
        let raw_search = query.get(spec.search_param).cloned().unwrap_or_default();
        Self {
            spec,
            search: search_term(Some(raw_search.as_str())),
            params: ListParams::from_raw_page(query.get("page").map(String::as_str), spec.page_size),
            raw_search,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchEcho {
    pub field: &'static str,
    pub value: String,
}

/// One page of a list endpoint
#[derive(Debug, Serialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub search: SearchEcho,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> ListPage<T> {
    pub fn new(request: ListRequest, result: PagedResult<T>) -> Self {
        Self {
            search: SearchEcho {
                field: request.spec.search_param,
                value: request.raw_search,
            },
            page: result.page,
            page_size: result.per_page,
            total: result.total,
            total_pages: result.total_pages(),
            has_next: result.has_next(),
            has_previous: result.has_prev(),
            items: result.items,
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Form state returned by form pages and failed submissions
#[derive(Debug, Serialize)]
pub struct FormPage<F, C = ()> {
    pub fields: &'static [&'static str],
    pub form: F,
    pub errors: FormErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<C>,
}

/// Render a form without relation choices
pub fn form_response<F: Serialize + FormFields>(form: F, errors: FormErrors) -> Response {
    Json(FormPage::<F, ()> {
        fields: F::FIELDS,
        form,
        errors,
        choices: None,
    })
    .into_response()
}

/// Render a form together with the options of its relation fields
pub fn form_response_with_choices<F: Serialize + FormFields, C: Serialize>(
    form: F,
    errors: FormErrors,
    choices: C,
) -> Response {
    Json(FormPage {
        fields: F::FIELDS,
        form,
        errors,
        choices: Some(choices),
    })
    .into_response()
}

/// Result of a form submission that did not fail outright
#[derive(Debug)]
pub enum FormOutcome {
    Saved,
    Invalid(FormErrors),
}

/// Split validation failures from other service errors
pub fn outcome<T>(result: Result<T, ServiceError>) -> Result<FormOutcome, ApiError> {
    match result {
        Ok(_) => Ok(FormOutcome::Saved),
        Err(ServiceError::Invalid(errors)) => Ok(FormOutcome::Invalid(errors)),
        Err(e) => Err(e.into()),
    }
}

/// `303 See Other` to `location`
pub fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}
