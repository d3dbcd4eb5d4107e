use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppResult;
use crate::middleware::PathParam;
use crate::models::Movie;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
}

// GET /api/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(state.catalog.list_movies().await?))
}

// GET /api/movies/{id}
async fn get_movie(State(state): State<Arc<AppState>>, PathParam(id): PathParam<i32>) -> AppResult<Json<Movie>> {
    Ok(Json(state.catalog.get_movie(id).await?))
}
