//! Read side: reference data and the composite views the screens need.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::cache::{CacheService, MOVIES_KEY, SNACKS_KEY, THEATRES_KEY};
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    Booking, BookingDetails, BookingSnackLine, Movie, Seat, Show, ShowWithTheatre, Snack, Theatre,
};
use crate::services::seats::SEAT_COLUMNS;

const MOVIE_COLUMNS: &str =
    "id, title, genre, duration, rating, description, poster_url, trailer_url, release_date";
const BOOKING_COLUMNS: &str = "id, user_id, show_id, total_price, payment_status, created_at";

// availableSeats is derived from live seat status, not stored on the show
const SHOW_COLUMNS: &str = "s.id, s.movie_id, s.theatre_id, s.show_time, s.format,
    (SELECT COUNT(*) FROM seats st WHERE st.show_id = s.id AND st.status = 'available') AS available_seats";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn list_movies(&self) -> AppResult<Vec<Movie>>;
    async fn get_movie(&self, id: i32) -> AppResult<Movie>;
    async fn list_theatres(&self, city: Option<String>) -> AppResult<Vec<Theatre>>;
    async fn list_shows(&self, movie_id: i32, theatre_id: Option<i32>) -> AppResult<Vec<ShowWithTheatre>>;
    async fn get_show(&self, id: i32) -> AppResult<Show>;
    async fn list_snacks(&self) -> AppResult<Vec<Snack>>;
    /// Booking history of one user, newest first.
    async fn list_bookings(&self, user_id: i32) -> AppResult<Vec<BookingDetails>>;
    async fn get_booking(&self, id: i32) -> AppResult<BookingDetails>;
}

#[derive(Clone)]
pub struct PgCatalog {
    db: Database,
    cache: CacheService,
}

impl PgCatalog {
    pub fn new(db: Database, cache: CacheService) -> Self {
        Self { db, cache }
    }

    async fn all_theatres(&self) -> AppResult<Vec<Theatre>> {
        self.cache
            .get_or_load(THEATRES_KEY, || async {
                let theatres = sqlx::query_as::<_, Theatre>(
                    "SELECT id, name, city, location, total_screens FROM theatres ORDER BY id",
                )
                .fetch_all(&self.db.pool)
                .await?;
                Ok(theatres)
            })
            .await
    }

    async fn details_for(&self, bookings: Vec<Booking>) -> AppResult<Vec<BookingDetails>> {
        if bookings.is_empty() {
            return Ok(Vec::new());
        }

        let booking_ids: Vec<i32> = bookings.iter().map(|b| b.id).collect();
        let show_ids = distinct(bookings.iter().map(|b| b.show_id));

        let shows = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows s WHERE s.id = ANY($1)"
        ))
        .bind(&show_ids)
        .fetch_all(&self.db.pool)
        .await?;

        let movie_ids = distinct(shows.iter().map(|s| s.movie_id));
        let theatre_ids = distinct(shows.iter().map(|s| s.theatre_id));

        let movies = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ANY($1)"
        ))
        .bind(&movie_ids)
        .fetch_all(&self.db.pool)
        .await?;

        let theatres = sqlx::query_as::<_, Theatre>(
            "SELECT id, name, city, location, total_screens FROM theatres WHERE id = ANY($1)",
        )
        .bind(&theatre_ids)
        .fetch_all(&self.db.pool)
        .await?;

        let seats = sqlx::query_as::<_, Seat>(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats WHERE booking_id = ANY($1) ORDER BY id"
        ))
        .bind(&booking_ids)
        .fetch_all(&self.db.pool)
        .await?;

        let lines = sqlx::query_as::<_, SnackLineRow>(
            "SELECT bs.booking_id, bs.quantity, sn.id, sn.name, sn.price, sn.image_url
             FROM booking_snacks bs
             JOIN snacks sn ON sn.id = bs.snack_id
             WHERE bs.booking_id = ANY($1)
             ORDER BY bs.id",
        )
        .bind(&booking_ids)
        .fetch_all(&self.db.pool)
        .await?;

        assemble_details(bookings, shows, movies, theatres, seats, lines)
    }
}

#[async_trait]
impl CatalogReader for PgCatalog {
    async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        self.cache
            .get_or_load(MOVIES_KEY, || async {
                let movies = sqlx::query_as::<_, Movie>(&format!(
                    "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY id"
                ))
                .fetch_all(&self.db.pool)
                .await?;
                Ok(movies)
            })
            .await
    }

    async fn get_movie(&self, id: i32) -> AppResult<Movie> {
        sqlx::query_as::<_, Movie>(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("movie", id))
    }

    async fn list_theatres(&self, city: Option<String>) -> AppResult<Vec<Theatre>> {
        let theatres = self.all_theatres().await?;
        Ok(match city {
            Some(city) => theatres.into_iter().filter(|t| t.city == city).collect(),
            None => theatres,
        })
    }

    async fn list_shows(&self, movie_id: i32, theatre_id: Option<i32>) -> AppResult<Vec<ShowWithTheatre>> {
        let rows = sqlx::query_as::<_, ShowTheatreRow>(&format!(
            "SELECT {SHOW_COLUMNS},
                    t.name AS theatre_name,
                    t.city AS theatre_city,
                    t.location AS theatre_location,
                    t.total_screens AS theatre_total_screens
             FROM shows s
             JOIN theatres t ON t.id = s.theatre_id
             WHERE s.movie_id = $1
               AND ($2::INT IS NULL OR s.theatre_id = $2)
             ORDER BY s.show_time, s.id"
        ))
        .bind(movie_id)
        .bind(theatre_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(rows.into_iter().map(ShowWithTheatre::from).collect())
    }

    async fn get_show(&self, id: i32) -> AppResult<Show> {
        sqlx::query_as::<_, Show>(&format!("SELECT {SHOW_COLUMNS} FROM shows s WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::not_found("show", id))
    }

    async fn list_snacks(&self) -> AppResult<Vec<Snack>> {
        self.cache
            .get_or_load(SNACKS_KEY, || async {
                let snacks = sqlx::query_as::<_, Snack>(
                    "SELECT id, name, price, image_url FROM snacks ORDER BY id",
                )
                .fetch_all(&self.db.pool)
                .await?;
                Ok(snacks)
            })
            .await
    }

    async fn list_bookings(&self, user_id: i32) -> AppResult<Vec<BookingDetails>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db.pool)
        .await?;

        self.details_for(bookings).await
    }

    async fn get_booking(&self, id: i32) -> AppResult<BookingDetails> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("booking", id))?;

        self.details_for(vec![booking])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("booking {id} vanished while loading")))
    }
}

#[derive(Debug, FromRow)]
struct ShowTheatreRow {
    id: i32,
    movie_id: i32,
    theatre_id: i32,
    show_time: NaiveDateTime,
    format: String,
    available_seats: i64,
    theatre_name: String,
    theatre_city: String,
    theatre_location: String,
    theatre_total_screens: i32,
}

impl From<ShowTheatreRow> for ShowWithTheatre {
    fn from(row: ShowTheatreRow) -> Self {
        ShowWithTheatre {
            show: Show {
                id: row.id,
                movie_id: row.movie_id,
                theatre_id: row.theatre_id,
                show_time: row.show_time,
                format: row.format,
                available_seats: row.available_seats,
            },
            theatre: Theatre {
                id: row.theatre_id,
                name: row.theatre_name,
                city: row.theatre_city,
                location: row.theatre_location,
                total_screens: row.theatre_total_screens,
            },
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SnackLineRow {
    pub booking_id: i32,
    pub quantity: i32,
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub image_url: Option<String>,
}

fn distinct(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Joins bookings with their show, movie, theatre, seats and snack lines.
///
/// A booking whose show, movie or theatre is missing is a broken foreign
/// key, reported as an internal error rather than skipped.
pub fn assemble_details(
    bookings: Vec<Booking>,
    shows: Vec<Show>,
    movies: Vec<Movie>,
    theatres: Vec<Theatre>,
    seats: Vec<Seat>,
    lines: Vec<SnackLineRow>,
) -> AppResult<Vec<BookingDetails>> {
    let shows: HashMap<i32, Show> = shows.into_iter().map(|s| (s.id, s)).collect();
    let movies: HashMap<i32, Movie> = movies.into_iter().map(|m| (m.id, m)).collect();
    let theatres: HashMap<i32, Theatre> = theatres.into_iter().map(|t| (t.id, t)).collect();

    let mut seats_by_booking: HashMap<i32, Vec<Seat>> = HashMap::new();
    for seat in seats {
        if let Some(booking_id) = seat.booking_id {
            seats_by_booking.entry(booking_id).or_default().push(seat);
        }
    }

    let mut lines_by_booking: HashMap<i32, Vec<BookingSnackLine>> = HashMap::new();
    for line in lines {
        lines_by_booking.entry(line.booking_id).or_default().push(BookingSnackLine {
            snack: Snack {
                id: line.id,
                name: line.name,
                price: line.price,
                image_url: line.image_url,
            },
            quantity: line.quantity,
        });
    }

    bookings
        .into_iter()
        .map(|booking| {
            let show = shows.get(&booking.show_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("booking {} references missing show {}", booking.id, booking.show_id))
            })?;
            let movie = movies.get(&show.movie_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("show {} references missing movie {}", show.id, show.movie_id))
            })?;
            let theatre = theatres.get(&show.theatre_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("show {} references missing theatre {}", show.id, show.theatre_id))
            })?;

            Ok(BookingDetails {
                seats: seats_by_booking.remove(&booking.id).unwrap_or_default(),
                snacks: lines_by_booking.remove(&booking.id).unwrap_or_default(),
                booking,
                show,
                movie,
                theatre,
            })
        })
        .collect()
}
