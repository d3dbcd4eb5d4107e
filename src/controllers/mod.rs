pub mod auth;
pub mod bookings;
pub mod movies;
pub mod seats;
pub mod shows;
pub mod snacks;
pub mod theatres;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(movies::routes())
        .merge(theatres::routes())
        .merge(shows::routes())
        .merge(seats::routes())
        .merge(snacks::routes())
        .merge(bookings::routes())
        .merge(auth::routes())
}
