use crate::db::Store;
use crate::errors::Error;
use crate::model::StoredReading;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::error;

/// Marker in the page template replaced by the readings JSON.
pub const READINGS_PLACEHOLDER: &str = "{{readings}}";

const API_DEFAULT_LIMIT: u32 = 100;
const API_MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
struct AppState {
    store: Store,
    template_path: PathBuf,
    page_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<u32>,
}

pub fn create_router(store: Store, template_path: PathBuf, page_limit: Option<u32>) -> Router {
    let state = AppState {
        store,
        template_path,
        page_limit,
    };

    Router::new()
        .route("/", get(dashboard))
        .route("/api/v1/readings", get(api_readings))
        .with_state(state)
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Html<String>, DashboardError> {
    // Read per request so template edits show up without a restart.
    let template = tokio::fs::read_to_string(&state.template_path)
        .await
        .map_err(|source| {
            DashboardError::Template(Error::Template {
                path: state.template_path.clone(),
                source,
            })
        })?;

    let readings = state
        .store
        .latest(params.limit.or(state.page_limit))
        .await
        .map_err(DashboardError::Storage)?;

    let json = serde_json::to_string(&readings)
        .map_err(|e| DashboardError::Encode(Error::Render(e.to_string())))?;

    render_page(&template, &json).map(Html).map_err(DashboardError::Template)
}

async fn api_readings(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<StoredReading>>, DashboardError> {
    let limit = params.limit.unwrap_or(API_DEFAULT_LIMIT).min(API_MAX_LIMIT);

    let readings = state
        .store
        .latest(Some(limit))
        .await
        .map_err(DashboardError::Storage)?;

    Ok(Json(readings))
}

/// Insert the readings JSON into the template.
///
/// `<`, `>` and `&` are replaced by their JSON unicode escapes, which keeps the
/// embedded text valid JSON and stops it from closing a `<script>` element.
pub fn render_page(template: &str, json: &str) -> crate::errors::Result<String> {
    if !template.contains(READINGS_PLACEHOLDER) {
        return Err(Error::Render(format!(
            "template has no {} placeholder",
            READINGS_PLACEHOLDER
        )));
    }

    let escaped = json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026");

    Ok(template.replace(READINGS_PLACEHOLDER, &escaped))
}

/// Dashboard failures. The client gets a short fixed message; details are logged.
#[derive(Debug)]
pub enum DashboardError {
    Template(Error),
    Storage(Error),
    Encode(Error),
}

impl DashboardError {
    fn public_message(&self) -> &'static str {
        match self {
            DashboardError::Template(_) => "Error loading template",
            DashboardError::Storage(_) => "Error fetching data",
            DashboardError::Encode(_) => "Error encoding data to JSON",
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (DashboardError::Template(e) | DashboardError::Storage(e) | DashboardError::Encode(e)) =
            &self;
        error!("Dashboard error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, self.public_message()).into_response()
    }
}
