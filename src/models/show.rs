use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Theatre;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: i32,
    pub movie_id: i32,
    pub theatre_id: i32,
    pub show_time: NaiveDateTime,
    pub format: String,
    /// Counted from seat rows at read time, never stored.
    pub available_seats: i64,
}

/// Listing row: a show joined with the theatre it plays in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowWithTheatre {
    #[serde(flatten)]
    pub show: Show,
    pub theatre: Theatre,
}
