use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;

use super::{BookingStore, BookingTx, NewBooking, SnackLine};
use crate::database::Database;
use crate::error::AppResult;
use crate::models::{Booking, Seat, SeatStatus};
use crate::services::seats;

#[derive(Clone)]
pub struct PgBookingStore {
    db: Database,
}

impl PgBookingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> AppResult<Box<dyn BookingTx>> {
        let tx = self.db.pool.begin().await?;
        Ok(Box::new(PgBookingTx { tx }))
    }
}

pub struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn lock_seats(&mut self, show_id: i32, seat_ids: &[i32]) -> AppResult<Vec<Seat>> {
        Ok(seats::lock_seats(&mut *self.tx, show_id, seat_ids).await?)
    }

    async fn snack_prices(&mut self, snack_ids: &[i32]) -> AppResult<HashMap<i32, i32>> {
        let rows: Vec<(i32, i32)> = sqlx::query_as("SELECT id, price FROM snacks WHERE id = ANY($1)")
            .bind(snack_ids)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (user_id, show_id, total_price, payment_status)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, show_id, total_price, payment_status, created_at",
        )
        .bind(booking.user_id)
        .bind(booking.show_id)
        .bind(booking.total_price)
        .bind(booking.payment_status.as_str())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn mark_seats_booked(&mut self, booking_id: i32, seat_ids: &[i32]) -> AppResult<u64> {
        Ok(seats::update_seats_status(&mut *self.tx, seat_ids, SeatStatus::Booked, Some(booking_id)).await?)
    }

    async fn insert_booking_snacks(&mut self, booking_id: i32, lines: &[SnackLine]) -> AppResult<()> {
        let snack_ids: Vec<i32> = lines.iter().map(|l| l.snack_id).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();

        sqlx::query(
            "INSERT INTO booking_snacks (booking_id, snack_id, quantity)
             SELECT $1, s.snack_id, s.quantity
             FROM UNNEST($2::INT[], $3::INT[]) AS s(snack_id, quantity)",
        )
        .bind(booking_id)
        .bind(&snack_ids)
        .bind(&quantities)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
