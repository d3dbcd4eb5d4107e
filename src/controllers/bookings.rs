use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::middleware::{AuthUser, PathParam, ValidatedJson};
use crate::models::{Booking, BookingDetails, CreateBookingRequest};
use crate::services::booking::BookingCart;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let cart = BookingCart::try_from(req)?;
    let booking = state.bookings.create_booking(user.user_id, cart).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<BookingDetails>>> {
    Ok(Json(state.catalog.list_bookings(user.user_id).await?))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    PathParam(id): PathParam<i32>,
) -> AppResult<Json<BookingDetails>> {
    let details = state.catalog.get_booking(id).await?;
    if details.booking.user_id != user.user_id {
        return Err(AppError::Forbidden("Booking belongs to another user".to_string()));
    }
    Ok(Json(details))
}
