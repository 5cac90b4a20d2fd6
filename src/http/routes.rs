use axum::{
    extract::{Path, State},
    Json,
};

use super::{error::AppError, AppState};
use crate::{Response, WindowStats};

pub(super) async fn respond_handler(State(state): State<AppState>) -> Json<Response> {
    Json(state.responder.respond())
}

pub(super) async fn stats_handler(State(state): State<AppState>) -> Json<WindowStats> {
    Json(state.responder.stats())
}

pub(super) async fn reset_handler(State(state): State<AppState>) -> Json<WindowStats> {
    Json(state.responder.reset_manually())
}

pub(super) async fn shard_respond_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Response>, AppError> {
    state
        .shards
        .respond(&key)
        .map(Json)
        .ok_or(AppError::CapacityExhausted)
}

pub(super) async fn shard_stats_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<WindowStats>, AppError> {
    state
        .shards
        .stats(&key)
        .map(Json)
        .ok_or(AppError::ShardNotFound(key))
}

pub(super) async fn shard_reset_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<WindowStats>, AppError> {
    state
        .shards
        .reset(&key)
        .map(Json)
        .ok_or(AppError::ShardNotFound(key))
}

pub(super) async fn health_handler() -> &'static str {
    "ok"
}
