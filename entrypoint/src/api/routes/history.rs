use std::sync::Arc;

use axum::{Json, extract::{Query, State}, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::debug;

use crate::ServerState;
use crate::routes::error_message_erasure::ApiError;

/// Hard cap on rows returned by one request, keeping the "no pagination"
/// simplification from being a liability against an unbounded collection.
const MAX_RESULTS: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryParams {
    limit: Option<i64>,
}

/// `GET /api/goods_history` — a direct passthrough over the ArticleHistory
/// collection, capped at `MAX_RESULTS` rows and otherwise unfiltered.
pub(crate) async fn history_handler(
    State(state): State<Arc<ServerState>>,
    WithRejection(Query(params), _): WithRejection<Query<HistoryParams>, ApiError>,
) -> Result<impl IntoResponse, StatusCode> {
    let limit = params.limit.unwrap_or(MAX_RESULTS).clamp(1, MAX_RESULTS);

    let history = state.catalog.recent_history(limit).await.map_err(|err| {
        debug!(%err, "failed to load goods history");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(history))
}
