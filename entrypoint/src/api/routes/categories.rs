use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use crate::ServerState;

/// `GET /api/categories` — a direct, unfiltered passthrough over the
/// Category collection. No pagination, no caching: the category tree is
/// small enough that the whole thing is the useful response.
pub(crate) async fn categories_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<impl IntoResponse, StatusCode> {
    let categories = state.categories.all().await.map_err(|err| {
        debug!(%err, "failed to load categories");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(categories))
}
