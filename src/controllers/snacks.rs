use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::error::AppResult;
use crate::models::Snack;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/snacks", get(list_snacks))
}

async fn list_snacks(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Snack>>> {
    Ok(Json(state.catalog.list_snacks().await?))
}
