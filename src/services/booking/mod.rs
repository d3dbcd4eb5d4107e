//! Booking transaction engine.
//!
//! Turns a cart (seats + snacks) into a paid booking. The availability check
//! and every write happen inside one store transaction that holds row locks
//! on the requested seats, so two overlapping carts cannot both succeed.

pub mod postgres;

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Booking, CreateBookingRequest, PaymentStatus, Seat, SeatStatus, SnackItem};

pub use postgres::PgBookingStore;

#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: i32,
    pub show_id: i32,
    pub total_price: i32,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnackLine {
    pub snack_id: i32,
    pub quantity: i32,
}

/// One open unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait BookingTx: Send {
    /// Locks the requested seats of `show_id` until the transaction ends.
    /// Ids that are not seats of that show are left out of the result.
    async fn lock_seats(&mut self, show_id: i32, seat_ids: &[i32]) -> AppResult<Vec<Seat>>;

    /// Current prices of the given snacks; unknown ids are absent.
    async fn snack_prices(&mut self, snack_ids: &[i32]) -> AppResult<HashMap<i32, i32>>;

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking>;

    /// Marks the seats booked by `booking_id` and returns how many rows changed.
    async fn mark_seats_booked(&mut self, booking_id: i32, seat_ids: &[i32]) -> AppResult<u64>;

    async fn insert_booking_snacks(&mut self, booking_id: i32, lines: &[SnackLine]) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn BookingTx>>;
}

/// A validated, normalized booking request: seat ids deduplicated and
/// sorted, snack lines merged per snack.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingCart {
    pub show_id: i32,
    pub seat_ids: Vec<i32>,
    pub snacks: Vec<SnackLine>,
}

impl BookingCart {
    pub fn new(
        show_id: i32,
        seat_ids: impl IntoIterator<Item = i32>,
        snacks: impl IntoIterator<Item = SnackItem>,
    ) -> AppResult<Self> {
        if show_id <= 0 {
            return Err(AppError::validation("showId must be positive"));
        }

        let seat_ids: BTreeSet<i32> = seat_ids.into_iter().collect();
        if seat_ids.is_empty() {
            return Err(AppError::validation("at least one seat must be selected"));
        }
        if let Some(bad) = seat_ids.iter().find(|id| **id <= 0) {
            return Err(AppError::validation(format!("invalid seat id {bad}")));
        }

        let mut merged: BTreeMap<i32, i32> = BTreeMap::new();
        for item in snacks {
            if item.snack_id <= 0 {
                return Err(AppError::validation(format!("invalid snack id {}", item.snack_id)));
            }
            if item.quantity < 1 {
                return Err(AppError::validation(format!(
                    "quantity for snack {} must be at least 1",
                    item.snack_id
                )));
            }
            let qty = merged.entry(item.snack_id).or_insert(0);
            *qty = qty
                .checked_add(item.quantity)
                .ok_or_else(|| AppError::validation("snack quantity too large"))?;
        }

        Ok(Self {
            show_id,
            seat_ids: seat_ids.into_iter().collect(),
            snacks: merged
                .into_iter()
                .map(|(snack_id, quantity)| SnackLine { snack_id, quantity })
                .collect(),
        })
    }
}

impl TryFrom<CreateBookingRequest> for BookingCart {
    type Error = AppError;

    fn try_from(req: CreateBookingRequest) -> Result<Self, Self::Error> {
        BookingCart::new(req.show_id, req.seat_ids, req.snacks.unwrap_or_default())
    }
}

/// Every requested seat must belong to the show and none may be booked yet.
pub fn check_selection(show_id: i32, requested: &[i32], locked: &[Seat]) -> AppResult<()> {
    let found: BTreeSet<i32> = locked.iter().map(|s| s.id).collect();
    if let Some(missing) = requested.iter().find(|id| !found.contains(id)) {
        return Err(AppError::validation(format!(
            "seat {missing} does not belong to show {show_id}"
        )));
    }

    let taken: Vec<&str> = locked
        .iter()
        .filter(|s| s.status == SeatStatus::Booked)
        .map(|s| s.seat_number.as_str())
        .collect();
    if !taken.is_empty() {
        return Err(AppError::validation(format!(
            "Some seats are already booked: {}",
            taken.join(", ")
        )));
    }

    Ok(())
}

/// Seat prices plus snack price times quantity, all from stored prices.
/// Snacks without a price contribute nothing.
pub fn price_booking(seats: &[Seat], snacks: &[SnackLine], snack_prices: &HashMap<i32, i32>) -> AppResult<i32> {
    let seat_total: i64 = seats.iter().map(|s| i64::from(s.price)).sum();
    let snack_total: i64 = snacks
        .iter()
        .filter_map(|line| {
            snack_prices
                .get(&line.snack_id)
                .map(|price| i64::from(*price) * i64::from(line.quantity))
        })
        .sum();

    i32::try_from(seat_total + snack_total)
        .map_err(|_| AppError::validation("booking total exceeds the supported amount"))
}

/// Snack lines that resolved to a stored snack; the rest are not recorded.
pub fn resolved_snack_lines(snacks: &[SnackLine], snack_prices: &HashMap<i32, i32>) -> Vec<SnackLine> {
    snacks
        .iter()
        .filter(|line| snack_prices.contains_key(&line.snack_id))
        .copied()
        .collect()
}

#[derive(Clone)]
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_booking(&self, user_id: i32, cart: BookingCart) -> AppResult<Booking> {
        // Any early return below drops `tx`, which rolls back.
        let mut tx = self.store.begin().await?;

        let seats = tx.lock_seats(cart.show_id, &cart.seat_ids).await?;
        check_selection(cart.show_id, &cart.seat_ids, &seats)?;

        let snack_prices = if cart.snacks.is_empty() {
            HashMap::new()
        } else {
            let ids: Vec<i32> = cart.snacks.iter().map(|l| l.snack_id).collect();
            tx.snack_prices(&ids).await?
        };
        let total_price = price_booking(&seats, &cart.snacks, &snack_prices)?;

        let booking = tx
            .insert_booking(&NewBooking {
                user_id,
                show_id: cart.show_id,
                total_price,
                // payment is mocked and always succeeds
                payment_status: PaymentStatus::Completed,
            })
            .await?;

        let updated = tx.mark_seats_booked(booking.id, &cart.seat_ids).await?;
        if updated != cart.seat_ids.len() as u64 {
            warn!(
                show_id = cart.show_id,
                expected = cart.seat_ids.len(),
                updated,
                "seat update count mismatch, abandoning booking"
            );
            return Err(AppError::Conflict(
                "Seat availability changed, please select your seats again".to_string(),
            ));
        }

        let lines = resolved_snack_lines(&cart.snacks, &snack_prices);
        if !lines.is_empty() {
            tx.insert_booking_snacks(booking.id, &lines).await?;
        }

        tx.commit().await?;

        info!(
            booking_id = booking.id,
            user_id,
            show_id = cart.show_id,
            seats = cart.seat_ids.len(),
            total_price,
            "booking created"
        );
        Ok(booking)
    }
}
