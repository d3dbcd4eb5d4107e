use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::UnknownVariant;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: i32,
    pub show_id: i32,
    pub seat_number: String,
    #[sqlx(try_from = "String")]
    pub category: SeatCategory,
    pub price: i32,
    #[sqlx(try_from = "String")]
    pub status: SeatStatus,
    pub booking_id: Option<i32>,
}

/// `booked` is terminal in the booking flow; `selected` is only ever written
/// through the low-level status primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Booked,
    Selected,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Booked => "booked",
            SeatStatus::Selected => "selected",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SeatStatus::Available),
            "booked" => Ok(SeatStatus::Booked),
            "selected" => Ok(SeatStatus::Selected),
            other => Err(UnknownVariant { kind: "seat status", value: other.to_string() }),
        }
    }
}

impl TryFrom<String> for SeatStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatCategory {
    #[serde(rename = "VIP")]
    Vip,
    Premium,
    #[serde(alias = "Normal")]
    Standard,
    Economy,
}

impl SeatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatCategory::Vip => "VIP",
            SeatCategory::Premium => "Premium",
            SeatCategory::Standard => "Standard",
            SeatCategory::Economy => "Economy",
        }
    }
}

impl fmt::Display for SeatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatCategory {
    type Err = UnknownVariant;

    // Older data used "Normal" for the standard tier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vip" => Ok(SeatCategory::Vip),
            "premium" => Ok(SeatCategory::Premium),
            "standard" | "normal" => Ok(SeatCategory::Standard),
            "economy" => Ok(SeatCategory::Economy),
            _ => Err(UnknownVariant { kind: "seat category", value: s.to_string() }),
        }
    }
}

impl TryFrom<String> for SeatCategory {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// PATCH /api/seats/{id}/status
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSeatStatusRequest {
    pub status: SeatStatus,
}
