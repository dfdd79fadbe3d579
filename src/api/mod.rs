//! Thin HTTP dispatch over the query engine.
//!
//! Handlers only parse parameters and map errors to status codes. Error bodies
//! are fixed strings so store details never reach a client.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::app::NewswireError;
use crate::query;
use crate::store::SharedStore;

pub const BAD_REQUEST_TEXT: &str = "invalid request parameters";
pub const NOT_FOUND_TEXT: &str = "news not found";
pub const INTERNAL_ERROR_TEXT: &str = "internal server error";

/// Set on every request that lacks it and echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
    store: SharedStore,
}

pub fn router(store: SharedStore) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/newsdetail/{id}", get(news_detail))
        .route("/newslist/", get(news_list))
        .route("/newslist/filtered/", get(news_filtered))
        .route("/newslist/filtered/date/", get(news_filtered_by_date))
        .layer(CorsLayer::very_permissive())
        // Outermost last: the id is assigned first, then traced, then copied to the response.
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id,
            )
        }))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
        .with_state(state)
}

type Params = Query<HashMap<String, String>>;

/// Integer parameter; absent or unparsable values become `fallback`.
fn int_param(params: &HashMap<String, String>, key: &str, fallback: i64) -> i64 {
    params
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(fallback)
}

fn error_response(err: NewswireError) -> Response {
    if err.is_validation() {
        tracing::debug!(error = %err, "rejected request");
        return (StatusCode::BAD_REQUEST, BAD_REQUEST_TEXT).into_response();
    }
    tracing::error!(error = %err, "query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_TEXT).into_response()
}

async fn news_detail(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id = raw_id.trim().parse().unwrap_or(0);
    match query::detail(state.store.as_ref(), id) {
        Ok(Some(article)) => Json(article).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, NOT_FOUND_TEXT).into_response(),
        Err(e) => error_response(e),
    }
}

async fn news_list(State(state): State<AppState>, Query(params): Params) -> Response {
    let count = int_param(&params, "n", 0);
    let page = int_param(&params, "page", 1);
    match query::list(state.store.as_ref(), count, page) {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => error_response(e),
    }
}

async fn news_filtered(State(state): State<AppState>, Query(params): Params) -> Response {
    let filter = params.get("s").map(String::as_str).unwrap_or("");
    let page = int_param(&params, "page", 1);
    match query::filter_by_content(state.store.as_ref(), filter, page) {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => error_response(e),
    }
}

async fn news_filtered_by_date(State(state): State<AppState>, Query(params): Params) -> Response {
    let published = int_param(&params, "date", 0);
    match query::filter_by_published(state.store.as_ref(), published) {
        Ok(articles) => Json(articles).into_response(),
        Err(e) => error_response(e),
    }
}
