use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use idiom_corpus::Corpus;
use idiom_engine::{Analyzer, FindOptions, IdiomMatch, MatchConfig, find_idioms};

pub const MAX_SENTENCE_LEN: usize = 2000;
const DEFAULT_LIMIT: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub analyzer: Arc<dyn Analyzer>,
    pub match_config: MatchConfig,
    pub max_limit: usize,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct IdiomsQuery {
    pub sentence: String,
    pub limit: Option<usize>,
    pub html: Option<bool>,
    pub span: Option<bool>,
    pub range: Option<bool>,
    pub id: Option<bool>,
}

#[derive(Serialize)]
pub struct IdiomsResponse {
    sentence: String,
    limit: usize,
    total: usize,
    items: Vec<IdiomMatch>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(frontend))
        .route("/robots.txt", get(robots))
        .route("/healthz", get(healthz))
        .route("/v1/idioms", get(idioms))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn robots(State(state): State<AppState>) -> Response {
    let headers = axum::http::HeaderMap::from_iter([
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        ),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400, immutable"),
        ),
    ]);
    if state.disable_cache {
        return "User-agent: *\nDisallow: /".into_response();
    }
    (headers, "User-agent: *\nDisallow: /").into_response()
}

async fn frontend(State(state): State<AppState>) -> Response {
    let html = Html(finder_html());
    if state.disable_cache {
        return html.into_response();
    }
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600, immutable"),
        )],
        html,
    )
        .into_response()
}

async fn idioms(
    State(state): State<AppState>,
    axum::extract::Query(params): axum::extract::Query<IdiomsQuery>,
) -> Result<Response, ApiError> {
    let sentence = params.sentence.trim();
    if sentence.is_empty() {
        return Err(ApiError::bad_request("sentence is required"));
    }
    if sentence.len() > MAX_SENTENCE_LEN {
        return Err(ApiError::bad_request(format!(
            "sentence must be at most {MAX_SENTENCE_LEN} bytes"
        )));
    }

    let mut limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err(ApiError::bad_request("limit must be >= 1"));
    }
    if limit > state.max_limit {
        limit = state.max_limit;
    }

    let options = FindOptions {
        limit,
        html: params.html.unwrap_or(false),
        span: params.span.unwrap_or(false),
        range: params.range.unwrap_or(false),
        id: params.id.unwrap_or(false),
    };
    let items = find_idioms(
        &state.corpus,
        state.analyzer.as_ref(),
        &state.match_config,
        sentence,
        &options,
    )
    .map_err(|e| {
        error!("idiom query failed: {e:#}");
        ApiError::Internal
    })?;

    let response = IdiomsResponse {
        sentence: sentence.to_string(),
        limit,
        total: items.len(),
        items,
    };

    if state.disable_cache {
        Ok(Json(response).into_response())
    } else {
        Ok((
            [(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=300"),
            )],
            Json(response),
        )
            .into_response())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

const BASE_HTML: &str = include_str!("../templates/base.html");
const STYLE_HTML: &str = include_str!("../templates/style.html");
const FINDER_BODY_HTML: &str = include_str!("../templates/finder_body.html");
const FINDER_SCRIPT: &str = include_str!("../templates/finder_script.js");

fn render_page(title: &str, body: &str, script: &str) -> String {
    BASE_HTML
        .replace("{{title}}", title)
        .replace("{{style}}", STYLE_HTML)
        .replace("{{body}}", body)
        .replace("{{scripts}}", &format!(r#"<script>{}</script>"#, script))
        .replace("__MAX_LEN__", &MAX_SENTENCE_LEN.to_string())
}

fn finder_html() -> String {
    render_page("Idiom Finder", FINDER_BODY_HTML, FINDER_SCRIPT)
}
