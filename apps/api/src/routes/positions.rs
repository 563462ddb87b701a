//! Open-position read routes.

use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use jejakcuan_db::{PositionRepository as _, PositionRow};
use std::sync::Arc;
use uuid::Uuid;

pub fn position_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_position))
        .route("/campaign/:campaign_id", get(list_open_for_campaign))
}

async fn get_position(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PositionRow>, (StatusCode, String)> {
    state
        .positions
        .get(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("position {id} not found")))
}

async fn list_open_for_campaign(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<PositionRow>>, (StatusCode, String)> {
    state
        .positions
        .get_open_by_campaign(campaign_id)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
