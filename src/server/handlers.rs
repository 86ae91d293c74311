//! API endpoint handlers.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::harvest::HarvestError;
use crate::models::{HarvestIssue, HarvestRequest, HarvestResult, SourceId};
use crate::scrapers::sites;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "OK",
        "service": "jobharvest",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Known sources that this server has adapters for.
pub async fn api_sources(State(state): State<AppState>) -> Response {
    let registered = state.harvester.registry().ids();
    match sites::describe() {
        Ok(infos) => Json(
            infos
                .into_iter()
                .filter(|info| registered.contains(&info.id))
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Body of `POST /api/parse` and `POST /api/parse/:source`. Every field is
/// optional. `pages` is signed so a negative value can be rejected explicitly.
#[derive(Debug, Default, Deserialize)]
pub struct ParseBody {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl ParseBody {
    /// An empty body means "all defaults".
    fn from_bytes(body: &[u8]) -> Result<Self, Response> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| {
            error_response(StatusCode::BAD_REQUEST, format!("invalid request body: {}", e))
        })
    }

    fn pages(&self) -> Result<u32, Response> {
        match self.pages {
            None => Ok(0),
            Some(n) if n < 0 => Err(error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                "pages must not be negative",
            )),
            Some(n) => u32::try_from(n).map_err(|_| {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, "pages out of range")
            }),
        }
    }

    fn into_request(self, sources: Vec<String>) -> Result<HarvestRequest, Response> {
        let pages = self.pages()?;
        Ok(HarvestRequest::new(
            self.query.unwrap_or_default(),
            sources,
            pages,
        ))
    }
}

/// Response of `POST /api/parse`.
#[derive(Debug, Serialize)]
pub struct HarvestSummary {
    pub message: String,
    pub total_found: usize,
    pub saved: usize,
    pub store_failures: usize,
    pub errors: Vec<HarvestIssue>,
    pub sources: Vec<SourceId>,
    pub pages: u32,
    pub query: String,
    pub cancelled: bool,
}

impl From<HarvestResult> for HarvestSummary {
    fn from(result: HarvestResult) -> Self {
        Self {
            message: "Parsing completed".to_string(),
            total_found: result.total_found(),
            saved: result.saved,
            store_failures: result.store_failures,
            errors: result.errors,
            sources: result.sources,
            pages: result.pages,
            query: result.query,
            cancelled: result.cancelled,
        }
    }
}

/// Response of `POST /api/parse/:source`.
#[derive(Debug, Serialize)]
pub struct SourceSummary {
    pub message: String,
    pub source: SourceId,
    pub total_found: usize,
    pub saved: usize,
    pub errors: Vec<HarvestIssue>,
    pub query: String,
    pub pages: u32,
}

fn harvest_error_response(e: HarvestError) -> Response {
    match e {
        HarvestError::EmptySourceSet => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        HarvestError::Config(_) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Harvest the requested sources (all known sources by default).
pub async fn parse_all(State(state): State<AppState>, body: Bytes) -> Response {
    let body = match ParseBody::from_bytes(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let sources = body.sources.clone().unwrap_or_default();
    let request = match body.into_request(sources) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let cancel = state.shutdown.child_token();
    match state.harvester.harvest(request, &cancel).await {
        Ok(result) => Json(HarvestSummary::from(result)).into_response(),
        Err(e) => harvest_error_response(e),
    }
}

/// Harvest one fixed source.
pub async fn parse_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
    body: Bytes,
) -> Response {
    let Some(id) = SourceId::parse(&source).filter(|id| state.harvester.registry().get(*id).is_some())
    else {
        return error_response(StatusCode::NOT_FOUND, format!("unknown source: {}", source));
    };

    let body = match ParseBody::from_bytes(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let request = match body.into_request(vec![id.as_str().to_string()]) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let cancel = state.shutdown.child_token();
    match state.harvester.harvest(request, &cancel).await {
        Ok(result) => Json(SourceSummary {
            message: format!("{} parsing completed", id.display_name()),
            source: id,
            total_found: result.total_found(),
            saved: result.saved,
            errors: result.errors,
            query: result.query,
            pages: result.pages,
        })
        .into_response(),
        Err(e) => harvest_error_response(e),
    }
}
