use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub genre: String,
    /// Running time in minutes.
    pub duration: i32,
    pub rating: Option<String>,
    pub description: String,
    pub poster_url: String,
    pub trailer_url: Option<String>,
    pub release_date: Option<NaiveDate>,
}
