//! Trade signal read routes, grounded on `routes/stocks.rs`'s
//! `State`/`Path`/`Query` handler shape.

use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use jejakcuan_db::{SignalRepository as _, SignalRow};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

pub fn signal_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id", get(get_signal))
        .route("/symbol/:symbol", get(list_for_symbol))
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    limit: Option<i64>,
}

async fn get_signal(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SignalRow>, (StatusCode, String)> {
    state
        .signals
        .get(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("signal {id} not found")))
}

async fn list_for_symbol(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<Vec<SignalRow>>, (StatusCode, String)> {
    state
        .signals
        .get_by_symbol(&symbol.to_uppercase(), query.limit.unwrap_or(50))
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
