//! Per-show seat inventory.
//!
//! The query functions take any Postgres executor so the booking transaction
//! can run them on its own connection; `PgSeatInventory` runs them on the pool.

use async_trait::async_trait;
use sqlx::PgExecutor;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Seat, SeatStatus};

pub const SEAT_COLUMNS: &str = "id, show_id, seat_number, category, price, status, booking_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// All seats of a show ordered by id; empty for an unknown show.
    async fn get_seats(&self, show_id: i32) -> AppResult<Vec<Seat>>;

    /// Unconditional status overwrite. Booking goes through the engine instead.
    async fn update_seat_status(&self, seat_id: i32, status: SeatStatus) -> AppResult<Seat>;
}

#[derive(Clone)]
pub struct PgSeatInventory {
    db: Database,
}

impl PgSeatInventory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SeatInventory for PgSeatInventory {
    async fn get_seats(&self, show_id: i32) -> AppResult<Vec<Seat>> {
        Ok(fetch_show_seats(&self.db.pool, show_id).await?)
    }

    async fn update_seat_status(&self, seat_id: i32, status: SeatStatus) -> AppResult<Seat> {
        let seat = sqlx::query_as::<_, Seat>(&format!(
            "UPDATE seats
             SET status = $1,
                 booking_id = CASE WHEN $1 = 'booked' THEN booking_id END
             WHERE id = $2
             RETURNING {SEAT_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(seat_id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("seat", seat_id))?;

        tracing::info!(seat_id, show_id = seat.show_id, status = %status, "seat status overwritten");
        Ok(seat)
    }
}

pub async fn fetch_show_seats<'e, E>(executor: E, show_id: i32) -> sqlx::Result<Vec<Seat>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {SEAT_COLUMNS} FROM seats WHERE show_id = $1 ORDER BY id");
    sqlx::query_as::<_, Seat>(&sql)
        .bind(show_id)
        .fetch_all(executor)
        .await
}

/// Row-locks the requested seats of one show until the surrounding
/// transaction ends. Locks are taken in id order so overlapping bookings
/// queue up instead of deadlocking. Ids outside the show are not returned.
pub async fn lock_seats<'e, E>(executor: E, show_id: i32, seat_ids: &[i32]) -> sqlx::Result<Vec<Seat>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {SEAT_COLUMNS}
         FROM seats
         WHERE show_id = $1 AND id = ANY($2)
         ORDER BY id
         FOR UPDATE"
    );
    sqlx::query_as::<_, Seat>(&sql)
        .bind(show_id)
        .bind(seat_ids)
        .fetch_all(executor)
        .await
}

/// Bulk status overwrite. Returns the number of rows touched; empty input is a no-op.
pub async fn update_seats_status<'e, E>(
    executor: E,
    seat_ids: &[i32],
    status: SeatStatus,
    booking_id: Option<i32>,
) -> sqlx::Result<u64>
where
    E: PgExecutor<'e>,
{
    if seat_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("UPDATE seats SET status = $1, booking_id = $2 WHERE id = ANY($3)")
        .bind(status.as_str())
        .bind(booking_id)
        .bind(seat_ids)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
