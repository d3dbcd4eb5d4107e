use axum::{
    extract::State,
    routing::patch,
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppResult;
use crate::middleware::{PathParam, ValidatedJson};
use crate::models::{Seat, UpdateSeatStatusRequest};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/seats/{id}/status", patch(update_seat_status))
}

// PATCH /api/seats/{id}/status
async fn update_seat_status(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
    ValidatedJson(req): ValidatedJson<UpdateSeatStatusRequest>,
) -> AppResult<Json<Seat>> {
    Ok(Json(state.seats.update_seat_status(id, req.status).await?))
}
