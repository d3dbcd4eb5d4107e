use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::middleware::PathParam;
use crate::models::{Seat, Show, ShowWithTheatre};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows))
        .route("/shows/{id}", get(get_show))
        .route("/shows/{id}/seats", get(get_seats))
}

// Raw strings so a bad number becomes our 400 body, not axum's plain-text rejection.
#[derive(Debug, Deserialize)]
pub struct ShowsQuery {
    #[serde(rename = "movieId")]
    pub movie_id: Option<String>,
    #[serde(rename = "theatreId")]
    pub theatre_id: Option<String>,
}

fn parse_id(name: &str, raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation(format!("Invalid query parameters: {name}")))
}

// GET /api/shows?movieId=&theatreId=
async fn list_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowsQuery>,
) -> AppResult<Json<Vec<ShowWithTheatre>>> {
    let movie_id = match params.movie_id.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_id("movieId", raw)?,
        _ => return Err(AppError::validation("Invalid query parameters: movieId is required")),
    };
    let theatre_id = match params.theatre_id.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_id("theatreId", raw)?),
        _ => None,
    };

    Ok(Json(state.catalog.list_shows(movie_id, theatre_id).await?))
}

// GET /api/shows/{id}
async fn get_show(State(state): State<Arc<AppState>>, PathParam(id): PathParam<i32>) -> AppResult<Json<Show>> {
    Ok(Json(state.catalog.get_show(id).await?))
}

// GET /api/shows/{id}/seats
async fn get_seats(State(state): State<Arc<AppState>>, PathParam(id): PathParam<i32>) -> AppResult<Json<Vec<Seat>>> {
    Ok(Json(state.seats.get_seats(id).await?))
}
