//! BMAD campaign read routes.

use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use jejakcuan_db::{CampaignRepository as _, CampaignRow};
use std::sync::Arc;
use uuid::Uuid;

pub fn campaign_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_campaign))
        .route("/symbol/:symbol", get(list_for_symbol))
}

async fn get_campaign(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignRow>, (StatusCode, String)> {
    state
        .campaigns
        .get(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("campaign {id} not found")))
}

async fn list_for_symbol(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<CampaignRow>>, (StatusCode, String)> {
    state
        .campaigns
        .get_by_symbol(&symbol.to_uppercase())
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
