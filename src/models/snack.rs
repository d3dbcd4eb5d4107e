use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snack {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub image_url: Option<String>,
}
