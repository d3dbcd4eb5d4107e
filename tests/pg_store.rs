//! Store tests against a real Postgres. `sqlx::test` creates a fresh database
//! per test and applies the embedded migrations; DATABASE_URL must point at a
//! server the tests may create databases on.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use movie_booking::cache::CacheService;
use movie_booking::database::Database;
use movie_booking::error::{AppError, AppResult};
use movie_booking::models::{Booking, PaymentStatus, Seat, SeatStatus, SnackItem};
use movie_booking::services::booking::{
    BookingCart, BookingEngine, BookingStore, BookingTx, NewBooking, PgBookingStore, SnackLine,
};
use movie_booking::services::catalog::{CatalogReader, PgCatalog};
use movie_booking::services::seats::{self, PgSeatInventory, SeatInventory};
use movie_booking::services::users::{NewUser, PgUserStore, UserStore};

const SEAT_PRICE: i32 = 200;
const POPCORN_PRICE: i32 = 150;

struct Fixture {
    db: Database,
    user_id: i32,
    movie_id: i32,
    theatres: [i32; 2],
    /// Inserted as: theatre 0 at 21:00, theatre 1 at 15:00, theatre 0 at 18:00.
    shows: [i32; 3],
    /// Show of another movie, in theatre 0.
    other_show: i32,
    snack_id: i32,
}

impl Fixture {
    async fn new(pool: PgPool) -> Self {
        let db = Database { pool };
        let user = PgUserStore::new(db.clone())
            .create_user(new_user("kavin@example.com"))
            .await
            .unwrap();

        let movie_id = insert_movie(&db.pool, "Inception").await;
        let other_movie = insert_movie(&db.pool, "Interstellar").await;
        let theatres = [
            insert_theatre(&db.pool, "PVR Phoenix", "Mumbai").await,
            insert_theatre(&db.pool, "INOX Forum", "Bangalore").await,
        ];

        let shows = [
            insert_show(&db.pool, movie_id, theatres[0], at(21)).await,
            insert_show(&db.pool, movie_id, theatres[1], at(15)).await,
            insert_show(&db.pool, movie_id, theatres[0], at(18)).await,
        ];
        let other_show = insert_show(&db.pool, other_movie, theatres[0], at(12)).await;

        let snack_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO snacks (name, price) VALUES ('Popcorn', $1) RETURNING id",
        )
        .bind(POPCORN_PRICE)
        .fetch_one(&db.pool)
        .await
        .unwrap();

        Self { db, user_id: user.id, movie_id, theatres, shows, other_show, snack_id }
    }

    fn engine(&self) -> BookingEngine {
        BookingEngine::new(Arc::new(PgBookingStore::new(self.db.clone())))
    }

    fn catalog(&self) -> PgCatalog {
        PgCatalog::new(self.db.clone(), CacheService::disabled())
    }

    fn inventory(&self) -> PgSeatInventory {
        PgSeatInventory::new(self.db.clone())
    }

    async fn seat_ids(&self, show_id: i32) -> Vec<i32> {
        seats::fetch_show_seats(&self.db.pool, show_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.db.pool)
            .await
            .unwrap()
    }
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "$2b$04$notarealhashbutlongenoughforthecolumn".to_string(),
        name: "Kavin".to_string(),
        phone: None,
        city: Some("Mumbai".to_string()),
    }
}

fn at(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 1, 15).unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

async fn insert_movie(pool: &PgPool, title: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO movies (title, genre, duration, description, poster_url)
         VALUES ($1, 'Sci-Fi', 148, 'A film.', 'https://img/poster.jpg')
         RETURNING id",
    )
    .bind(title)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_theatre(pool: &PgPool, name: &str, city: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO theatres (name, city, location, total_screens)
         VALUES ($1, $2, 'Main Road', 4)
         RETURNING id",
    )
    .bind(name)
    .bind(city)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A show with four Standard seats A1..A4.
async fn insert_show(pool: &PgPool, movie_id: i32, theatre_id: i32, show_time: NaiveDateTime) -> i32 {
    let show_id: i32 = sqlx::query_scalar(
        "INSERT INTO shows (movie_id, theatre_id, show_time, format)
         VALUES ($1, $2, $3, 'IMAX 2D')
         RETURNING id",
    )
    .bind(movie_id)
    .bind(theatre_id)
    .bind(show_time)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO seats (show_id, seat_number, category, price)
         SELECT $1, 'A' || n, 'Standard', $2 FROM generate_series(1, 4) AS n",
    )
    .bind(show_id)
    .bind(SEAT_PRICE)
    .execute(pool)
    .await
    .unwrap();

    show_id
}

fn cart(show_id: i32, seat_ids: &[i32], snacks: &[(i32, i32)]) -> BookingCart {
    BookingCart::new(
        show_id,
        seat_ids.iter().copied(),
        snacks.iter().map(|(snack_id, quantity)| SnackItem { snack_id: *snack_id, quantity: *quantity }),
    )
    .unwrap()
}

/// Passes everything through to Postgres but fails the snack insert, after
/// the booking row and seat updates have already been written in the tx.
struct FailingSnackInsert(PgBookingStore);

#[async_trait]
impl BookingStore for FailingSnackInsert {
    async fn begin(&self) -> AppResult<Box<dyn BookingTx>> {
        Ok(Box::new(FailingSnackTx(self.0.begin().await?)))
    }
}

struct FailingSnackTx(Box<dyn BookingTx>);

#[async_trait]
impl BookingTx for FailingSnackTx {
    async fn lock_seats(&mut self, show_id: i32, seat_ids: &[i32]) -> AppResult<Vec<Seat>> {
        self.0.lock_seats(show_id, seat_ids).await
    }

    async fn snack_prices(&mut self, snack_ids: &[i32]) -> AppResult<HashMap<i32, i32>> {
        self.0.snack_prices(snack_ids).await
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        self.0.insert_booking(booking).await
    }

    async fn mark_seats_booked(&mut self, booking_id: i32, seat_ids: &[i32]) -> AppResult<u64> {
        self.0.mark_seats_booked(booking_id, seat_ids).await
    }

    async fn insert_booking_snacks(&mut self, _booking_id: i32, _lines: &[SnackLine]) -> AppResult<()> {
        Err(AppError::Internal("snack insert failed".to_string()))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.0.commit().await
    }
}

#[sqlx::test(migrations = "./src/migrations")]
async fn books_seats_and_snacks(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let seat_ids = fx.seat_ids(fx.shows[0]).await;

    let booking = fx
        .engine()
        .create_booking(fx.user_id, cart(fx.shows[0], &seat_ids[..2], &[(fx.snack_id, 2)]))
        .await
        .unwrap();

    assert_eq!(booking.total_price, 2 * SEAT_PRICE + 2 * POPCORN_PRICE);
    assert_eq!(booking.payment_status, PaymentStatus::Completed);

    let seats = fx.inventory().get_seats(fx.shows[0]).await.unwrap();
    for seat in &seats[..2] {
        assert_eq!(seat.status, SeatStatus::Booked);
        assert_eq!(seat.booking_id, Some(booking.id));
    }
    for seat in &seats[2..] {
        assert_eq!(seat.status, SeatStatus::Available);
        assert_eq!(seat.booking_id, None);
    }

    let lines: Vec<(i32, i32, i32)> =
        sqlx::query_as("SELECT booking_id, snack_id, quantity FROM booking_snacks")
            .fetch_all(&fx.db.pool)
            .await
            .unwrap();
    assert_eq!(lines, vec![(booking.id, fx.snack_id, 2)]);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn overlapping_concurrent_bookings_have_one_winner(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let seat_ids = fx.seat_ids(fx.shows[0]).await;
    let engine = fx.engine();

    // Every cart contains the second seat, plus one of the others.
    let mut handles = Vec::new();
    for i in 0..8 {
        let other = seat_ids[[0, 2, 3][i % 3]];
        let cart = cart(fx.shows[0], &[seat_ids[1], other], &[(fx.snack_id, 1)]);
        let engine = engine.clone();
        let user_id = fx.user_id;
        handles.push(tokio::spawn(async move { engine.create_booking(user_id, cart).await }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(booking) => winners.push(booking),
            Err(AppError::Validation(msg)) => assert!(msg.contains("already booked"), "{msg}"),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(fx.count("bookings").await, 1);
    assert_eq!(fx.count("booking_snacks").await, 1);

    let booked: Vec<Seat> = fx
        .inventory()
        .get_seats(fx.shows[0])
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.status == SeatStatus::Booked)
        .collect();
    assert_eq!(booked.len(), 2);
    assert!(booked.iter().all(|s| s.booking_id == Some(winners[0].id)));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn disjoint_concurrent_bookings_all_succeed(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let seat_ids = fx.seat_ids(fx.shows[0]).await;
    let engine = fx.engine();

    let handles: Vec<_> = seat_ids
        .iter()
        .map(|id| {
            let engine = engine.clone();
            let cart = cart(fx.shows[0], &[*id], &[]);
            let user_id = fx.user_id;
            tokio::spawn(async move { engine.create_booking(user_id, cart).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(fx.count("bookings").await, 4);
    assert_eq!(fx.catalog().get_show(fx.shows[0]).await.unwrap().available_seats, 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn failure_after_seat_update_rolls_everything_back(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let seat_ids = fx.seat_ids(fx.shows[0]).await;
    let engine = BookingEngine::new(Arc::new(FailingSnackInsert(PgBookingStore::new(fx.db.clone()))));

    let err = engine
        .create_booking(fx.user_id, cart(fx.shows[0], &seat_ids[..2], &[(fx.snack_id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    assert_eq!(fx.count("bookings").await, 0);
    assert_eq!(fx.count("booking_snacks").await, 0);
    let seats = fx.inventory().get_seats(fx.shows[0]).await.unwrap();
    assert!(seats.iter().all(|s| s.status == SeatStatus::Available && s.booking_id.is_none()));

    // The seats are free for the next customer.
    fx.engine()
        .create_booking(fx.user_id, cart(fx.shows[0], &seat_ids[..2], &[]))
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./src/migrations")]
async fn seats_of_another_show_are_rejected(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let foreign = fx.seat_ids(fx.shows[1]).await;
    let own = fx.seat_ids(fx.shows[0]).await;

    let mut conn = fx.db.pool.acquire().await.unwrap();
    let locked = seats::lock_seats(&mut *conn, fx.shows[0], &[own[0], foreign[0]]).await.unwrap();
    assert_eq!(locked.iter().map(|s| s.id).collect::<Vec<_>>(), vec![own[0]]);
    drop(conn);

    let err = fx
        .engine()
        .create_booking(fx.user_id, cart(fx.shows[0], &[own[0], foreign[0]], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(fx.count("bookings").await, 0);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn bulk_status_update_reports_rows_touched(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let seat_ids = fx.seat_ids(fx.shows[0]).await;

    let none = seats::update_seats_status(&fx.db.pool, &[], SeatStatus::Selected, None).await.unwrap();
    assert_eq!(none, 0);

    let touched = seats::update_seats_status(&fx.db.pool, &[seat_ids[0], seat_ids[1], 999_999], SeatStatus::Selected, None)
        .await
        .unwrap();
    assert_eq!(touched, 2);

    let seats = fx.inventory().get_seats(fx.shows[0]).await.unwrap();
    assert_eq!(seats[0].status, SeatStatus::Selected);
    assert_eq!(seats[2].status, SeatStatus::Available);
}

#[sqlx::test(migrations = "./src/migrations")]
async fn status_overwrite_keeps_booking_link_only_for_booked(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let seat_ids = fx.seat_ids(fx.shows[0]).await;
    let booking = fx
        .engine()
        .create_booking(fx.user_id, cart(fx.shows[0], &seat_ids[..2], &[]))
        .await
        .unwrap();
    let inventory = fx.inventory();

    let still_booked = inventory.update_seat_status(seat_ids[0], SeatStatus::Booked).await.unwrap();
    assert_eq!(still_booked.booking_id, Some(booking.id));

    let released = inventory.update_seat_status(seat_ids[1], SeatStatus::Available).await.unwrap();
    assert_eq!(released.status, SeatStatus::Available);
    assert_eq!(released.booking_id, None);

    let selected = inventory.update_seat_status(seat_ids[2], SeatStatus::Selected).await.unwrap();
    assert_eq!(selected.booking_id, None);

    let err = inventory.update_seat_status(999_999, SeatStatus::Available).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn show_and_seat_reads_are_repeatable(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let catalog = fx.catalog();
    let inventory = fx.inventory();

    let first = catalog.get_show(fx.shows[0]).await.unwrap();
    let second = catalog.get_show(fx.shows[0]).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.available_seats, 4);

    let seats_first = inventory.get_seats(fx.shows[0]).await.unwrap();
    let seats_second = inventory.get_seats(fx.shows[0]).await.unwrap();
    assert_eq!(seats_first, seats_second);
    assert_eq!(seats_first.len(), 4);

    let seat_ids: Vec<i32> = seats_first.iter().map(|s| s.id).collect();
    fx.engine()
        .create_booking(fx.user_id, cart(fx.shows[0], &seat_ids[1..3], &[]))
        .await
        .unwrap();

    assert_eq!(catalog.get_show(fx.shows[0]).await.unwrap().available_seats, 2);
    // Other shows are untouched.
    assert_eq!(catalog.get_show(fx.shows[1]).await.unwrap().available_seats, 4);

    let err = catalog.get_show(999_999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn shows_are_ordered_by_time_and_filtered_by_theatre(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let catalog = fx.catalog();

    let all = catalog.list_shows(fx.movie_id, None).await.unwrap();
    let ids: Vec<i32> = all.iter().map(|s| s.show.id).collect();
    assert_eq!(ids, vec![fx.shows[1], fx.shows[2], fx.shows[0]]);
    assert!(!ids.contains(&fx.other_show));
    assert_eq!(all[0].theatre.name, "INOX Forum");
    assert_eq!(all[0].theatre.city, "Bangalore");

    let in_first = catalog.list_shows(fx.movie_id, Some(fx.theatres[0])).await.unwrap();
    let ids: Vec<i32> = in_first.iter().map(|s| s.show.id).collect();
    assert_eq!(ids, vec![fx.shows[2], fx.shows[0]]);
    assert!(in_first.iter().all(|s| s.theatre.id == fx.theatres[0]));

    assert!(catalog.list_shows(fx.movie_id, Some(999_999)).await.unwrap().is_empty());
    assert!(catalog.list_shows(999_999, None).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./src/migrations")]
async fn booking_details_group_seats_and_snacks(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let engine = fx.engine();
    let first_show = fx.seat_ids(fx.shows[0]).await;
    let second_show = fx.seat_ids(fx.shows[1]).await;

    let older = engine
        .create_booking(fx.user_id, cart(fx.shows[0], &first_show[..2], &[(fx.snack_id, 3)]))
        .await
        .unwrap();
    let newer = engine
        .create_booking(fx.user_id, cart(fx.shows[1], &second_show[..1], &[]))
        .await
        .unwrap();

    let catalog = fx.catalog();
    let list = catalog.list_bookings(fx.user_id).await.unwrap();
    assert_eq!(list.iter().map(|d| d.booking.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

    let details = catalog.get_booking(older.id).await.unwrap();
    assert_eq!(details, list[1]);
    assert_eq!(details.show.id, fx.shows[0]);
    assert_eq!(details.movie.title, "Inception");
    assert_eq!(details.theatre.id, fx.theatres[0]);
    assert_eq!(details.seats.iter().map(|s| s.id).collect::<Vec<_>>(), first_show[..2].to_vec());
    assert_eq!(details.snacks.len(), 1);
    assert_eq!(details.snacks[0].snack.id, fx.snack_id);
    assert_eq!(details.snacks[0].quantity, 3);

    assert_eq!(list[0].seats.len(), 1);
    assert!(list[0].snacks.is_empty());
    assert_eq!(list[0].theatre.id, fx.theatres[1]);

    let other_user = PgUserStore::new(fx.db.clone())
        .create_user(new_user("asha@example.com"))
        .await
        .unwrap();
    assert!(catalog.list_bookings(other_user.id).await.unwrap().is_empty());

    let err = catalog.get_booking(999_999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[sqlx::test(migrations = "./src/migrations")]
async fn email_uniqueness_ignores_case(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let users = PgUserStore::new(fx.db.clone());

    let err = users.create_user(new_user("Kavin@Example.COM")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "{err:?}");
    assert_eq!(fx.count("users").await, 1);

    let found = users.find_by_email("KAVIN@example.com".to_string()).await.unwrap().unwrap();
    assert_eq!(found.id, fx.user_id);

    let mixed = users.create_user(new_user("Asha@Example.com")).await.unwrap();
    assert_eq!(mixed.email, "asha@example.com");
}
