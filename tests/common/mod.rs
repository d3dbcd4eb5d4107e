//! In-memory booking store with real transaction semantics: one writer at a
//! time, writes land only on commit, and dropping a transaction discards them.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use movie_booking::error::{AppError, AppResult};
use movie_booking::models::{Booking, PaymentStatus, Seat, SeatCategory, SeatStatus};
use movie_booking::services::booking::{BookingStore, BookingTx, NewBooking, SnackLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Snack line insert fails after seats are already marked.
    SnackInsert,
    /// Seat update reports one row fewer than requested.
    ShortSeatUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub seats: BTreeMap<i32, Seat>,
    pub snack_prices: HashMap<i32, i32>,
    pub bookings: Vec<Booking>,
    pub booking_snacks: Vec<(i32, SnackLine)>,
    next_booking_id: i32,
}

impl Tables {
    pub fn seat(&self, id: i32) -> &Seat {
        &self.seats[&id]
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fault: Option<Fault>,
}

impl MemoryStore {
    pub fn new(seats: Vec<Seat>, snack_prices: HashMap<i32, i32>) -> Self {
        let tables = Tables {
            seats: seats.into_iter().map(|s| (s.id, s)).collect(),
            snack_prices,
            bookings: Vec::new(),
            booking_snacks: Vec::new(),
            next_booking_id: 1,
        };
        Self { tables: Arc::new(Mutex::new(tables)), fault: None }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn BookingTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working, fault: self.fault }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fault: Option<Fault>,
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn lock_seats(&mut self, show_id: i32, seat_ids: &[i32]) -> AppResult<Vec<Seat>> {
        Ok(seat_ids
            .iter()
            .filter_map(|id| self.working.seats.get(id))
            .filter(|s| s.show_id == show_id)
            .cloned()
            .collect())
    }

    async fn snack_prices(&mut self, snack_ids: &[i32]) -> AppResult<HashMap<i32, i32>> {
        Ok(snack_ids
            .iter()
            .filter_map(|id| self.working.snack_prices.get(id).map(|p| (*id, *p)))
            .collect())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        let row = Booking {
            id: self.working.next_booking_id,
            user_id: booking.user_id,
            show_id: booking.show_id,
            total_price: booking.total_price,
            payment_status: booking.payment_status,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.working.next_booking_id += 1;
        self.working.bookings.push(row.clone());
        Ok(row)
    }

    async fn mark_seats_booked(&mut self, booking_id: i32, seat_ids: &[i32]) -> AppResult<u64> {
        let mut touched = 0u64;
        for id in seat_ids {
            if let Some(seat) = self.working.seats.get_mut(id) {
                seat.status = SeatStatus::Booked;
                seat.booking_id = Some(booking_id);
                touched += 1;
            }
        }
        if self.fault == Some(Fault::ShortSeatUpdate) {
            touched = touched.saturating_sub(1);
        }
        Ok(touched)
    }

    async fn insert_booking_snacks(&mut self, booking_id: i32, lines: &[SnackLine]) -> AppResult<()> {
        if self.fault == Some(Fault::SnackInsert) {
            return Err(AppError::Internal("snack insert failed".to_string()));
        }
        self.working
            .booking_snacks
            .extend(lines.iter().map(|line| (booking_id, *line)));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}

pub fn seat(id: i32, show_id: i32, category: SeatCategory, price: i32) -> Seat {
    Seat {
        id,
        show_id,
        seat_number: format!("S{id}"),
        category,
        price,
        status: SeatStatus::Available,
        booking_id: None,
    }
}

/// Show 1 has seats 1-4 (two VIP at 500, two Premium at 350); show 2 has seat 5.
/// Snacks: 1 costs 150, 2 costs 250.
pub fn demo_store() -> MemoryStore {
    MemoryStore::new(
        vec![
            seat(1, 1, SeatCategory::Vip, 500),
            seat(2, 1, SeatCategory::Vip, 500),
            seat(3, 1, SeatCategory::Premium, 350),
            seat(4, 1, SeatCategory::Premium, 350),
            seat(5, 2, SeatCategory::Standard, 200),
        ],
        HashMap::from([(1, 150), (2, 250)]),
    )
}

pub fn completed(booking: &Booking) -> bool {
    booking.payment_status == PaymentStatus::Completed
}
