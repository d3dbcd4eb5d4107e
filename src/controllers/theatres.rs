use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::Theatre;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/theatres", get(list_theatres))
}

#[derive(Debug, Deserialize)]
pub struct TheatresQuery {
    pub city: Option<String>,
}

// GET /api/theatres?city=
async fn list_theatres(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TheatresQuery>,
) -> AppResult<Json<Vec<Theatre>>> {
    // an empty ?city= means no filter
    let city = params.city.filter(|c| !c.trim().is_empty());
    Ok(Json(state.catalog.list_theatres(city).await?))
}
