//! Signal approval queue routes: the human gate between a validated
//! signal and an open position (spec §4.13). Every transition (submit,
//! approve, reject, expire) emits exactly one typed `AuditEvent` over
//! the event bus so every connected dashboard sees the resolution live.

use crate::auth::AuthUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use jejakcuan_audit::events;
use jejakcuan_db::{DbError, QueueEntryRepository as _, QueueEntryRow, SignalRepository as _};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Spec §4.13's default approval window: a PENDING entry expires this
/// long after submission unless approved or rejected first.
const DEFAULT_APPROVAL_WINDOW_MINUTES: i64 = 15;

pub fn queue_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(submit))
        .route("/user/:user_id", get(list_pending_for_user))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
}

async fn list_pending_for_user(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<QueueEntryRow>>, (StatusCode, String)> {
    state
        .queue
        .get_pending_for_user(user_id)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub signal_id: Uuid,
}

async fn submit(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<QueueEntryRow>, (StatusCode, String)> {
    let signal = state
        .signals
        .get(body.signal_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, format!("signal {} not found", body.signal_id)))?;

    let submitted_at = Utc::now();
    let row = QueueEntryRow {
        id: Uuid::new_v4(),
        signal_id: signal.id,
        user_id: user.user_id(),
        status: "pending".to_string(),
        submitted_at,
        expires_at: submitted_at + Duration::minutes(DEFAULT_APPROVAL_WINDOW_MINUTES),
        approved_at: None,
        rejection_reason: None,
        snapshot: signal.payload.clone(),
    };

    let created = state
        .queue
        .create(&row)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let event = events::queue_added(
        &created.id.to_string(),
        &signal.id.to_string(),
        &signal.symbol,
        &signal.pattern_type,
    );
    state.event_bus.publish("queue_added", serde_json::to_value(&event).unwrap_or_default()).await;

    Ok(Json(created))
}

fn db_error_status(err: &DbError) -> StatusCode {
    match err {
        DbError::NotFound(_) => StatusCode::NOT_FOUND,
        DbError::Forbidden(_) => StatusCode::FORBIDDEN,
        DbError::Conflict(_) => StatusCode::CONFLICT,
        DbError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn approve(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user_id = user.user_id();
    state
        .queue
        .approve(id, user_id, Utc::now())
        .await
        .map_err(|e| (db_error_status(&e), e.to_string()))?;

    let entry = state
        .queue
        .get(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let signal_id = entry.map(|e| e.signal_id).unwrap_or(id);
    let event = events::signal_approved(&id.to_string(), &signal_id.to_string(), &user_id.to_string());
    state.event_bus.publish("queue_approved", serde_json::to_value(&event).unwrap_or_default()).await;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

async fn reject(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user_id = user.user_id();
    state
        .queue
        .reject(id, user_id, &body.reason)
        .await
        .map_err(|e| (db_error_status(&e), e.to_string()))?;

    let entry = state
        .queue
        .get(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let signal_id = entry.map(|e| e.signal_id).unwrap_or(id);
    let event = events::signal_rejected(&id.to_string(), &signal_id.to_string(), &body.reason);
    state
        .event_bus
        .publish("queue_rejected", serde_json::to_value(&event).unwrap_or_default())
        .await;

    Ok(StatusCode::NO_CONTENT)
}
