//! Demo catalog for fresh databases.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::database::Database;
use crate::models::SeatCategory;

const SEAT_ROWS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

struct MovieSeed {
    title: &'static str,
    genre: &'static str,
    duration: i32,
    rating: &'static str,
    description: &'static str,
    poster: &'static str,
    trailer: &'static str,
    released: (i32, u32, u32),
}

const MOVIES: &[MovieSeed] = &[
    MovieSeed {
        title: "Inception",
        genre: "Sci-Fi",
        duration: 148,
        rating: "UA",
        description: "A thief who steals corporate secrets through the use of dream-sharing technology is given the inverse task of planting an idea into the mind of a C.E.O.",
        poster: "https://image.tmdb.org/t/p/w500/9gk7admal4zlWH9O9GLyxHgWTPd.jpg",
        trailer: "https://www.youtube.com/embed/YoHD9XEInc0",
        released: (2010, 7, 16),
    },
    MovieSeed {
        title: "The Dark Knight",
        genre: "Action",
        duration: 152,
        rating: "UA",
        description: "When the menace known as the Joker wreaks havoc and chaos on the people of Gotham, Batman must accept one of the greatest psychological and physical tests of his ability to fight injustice.",
        poster: "https://image.tmdb.org/t/p/w500/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
        trailer: "https://www.youtube.com/embed/EXeTwQWrcwY",
        released: (2008, 7, 18),
    },
    MovieSeed {
        title: "Interstellar",
        genre: "Sci-Fi",
        duration: 169,
        rating: "UA",
        description: "A team of explorers travel through a wormhole in space in an attempt to ensure humanity's survival.",
        poster: "https://image.tmdb.org/t/p/w500/gEU2QniL6E8ahMcafCUyGdjEOL.jpg",
        trailer: "https://www.youtube.com/embed/zSWdZVtXT7E",
        released: (2014, 11, 7),
    },
    MovieSeed {
        title: "Avengers: Endgame",
        genre: "Action",
        duration: 181,
        rating: "UA",
        description: "After the devastating events that wiped out half the universe, the Avengers assemble once more to reverse Thanos' actions and restore balance.",
        poster: "https://image.tmdb.org/t/p/w500/or06FQrDklbnkAqJiVWI0nVjagV.jpg",
        trailer: "https://www.youtube.com/embed/TcMBFSGVi1c",
        released: (2019, 4, 26),
    },
    MovieSeed {
        title: "Pulp Fiction",
        genre: "Drama",
        duration: 154,
        rating: "A",
        description: "The lives of two mob hitmen, a boxer, a gangster and his wife intertwine in four tales of violence and redemption.",
        poster: "https://image.tmdb.org/t/p/w500/dM2w4PZqPHwWQx4isNRjYW6i1F6.jpg",
        trailer: "https://www.youtube.com/embed/s7EdQ4FqbdE",
        released: (1994, 10, 14),
    },
    MovieSeed {
        title: "The Shawshank Redemption",
        genre: "Drama",
        duration: 142,
        rating: "A",
        description: "Two imprisoned men bond over a number of years, finding solace and eventual redemption through acts of common decency.",
        poster: "https://image.tmdb.org/t/p/w500/q6725aR8Zs4IwGMAnUtaDtjH3z8.jpg",
        trailer: "https://www.youtube.com/embed/NmzuHjWmXOc",
        released: (1994, 9, 23),
    },
    MovieSeed {
        title: "The Matrix",
        genre: "Sci-Fi",
        duration: 136,
        rating: "UA",
        description: "A computer hacker learns from mysterious rebels about the true nature of his reality and his role in the war against its controllers.",
        poster: "https://image.tmdb.org/t/p/w500/f89U3ADr1oiB1s9GkdPOEpXqfAC.jpg",
        trailer: "https://www.youtube.com/embed/vKQi3bBA1y8",
        released: (1999, 3, 31),
    },
    MovieSeed {
        title: "Parasite",
        genre: "Drama",
        duration: 132,
        rating: "UA",
        description: "Greed and class discrimination threaten the newly formed symbiotic relationship between the wealthy Park family and the destitute Kim clan.",
        poster: "https://image.tmdb.org/t/p/w500/7IeUWlBSMDyIwmJ0IB7vyJySXyJ.jpg",
        trailer: "https://www.youtube.com/embed/isloHekVcag",
        released: (2019, 5, 30),
    },
    MovieSeed {
        title: "Oppenheimer",
        genre: "Biography",
        duration: 180,
        rating: "UA",
        description: "The story of American scientist J. Robert Oppenheimer and his role in the development of the atomic bomb during World War II.",
        poster: "https://image.tmdb.org/t/p/w500/8Gxv8gStzWANeGkN3UNO59pHk2J.jpg",
        trailer: "https://www.youtube.com/embed/uYPbbksJxJ8",
        released: (2023, 7, 21),
    },
    MovieSeed {
        title: "Dune",
        genre: "Sci-Fi",
        duration: 166,
        rating: "UA",
        description: "Paul Atreides travels to the dangerous planet Arrakis to ensure the future of his family and people in this adaptation of Frank Herbert's epic novel.",
        poster: "https://image.tmdb.org/t/p/w500/lJvsGW63g2sGrAvoznkQ0nRnabw.jpg",
        trailer: "https://www.youtube.com/embed/n9xhJrCXkzs",
        released: (2021, 10, 22),
    },
];

// (name, city, location, screens)
const THEATRES: &[(&str, &str, &str, i32)] = &[
    ("PVR Cinemas", "Mumbai", "Phoenix Marketcity, Kurla", 5),
    ("INOX", "Mumbai", "R-City Mall, Ghatkopar", 4),
];

const SNACKS: &[(&str, i32, &str)] = &[
    ("Salted Popcorn (Large)", 350, "https://placehold.co/200x200?text=Popcorn"),
    ("Coca Cola (500ml)", 150, "https://placehold.co/200x200?text=Coke"),
    ("Nachos with Cheese", 250, "https://placehold.co/200x200?text=Nachos"),
];

/// Price of each category for one hall.
#[derive(Debug, Clone, Copy)]
pub struct PriceTier {
    pub vip: i32,
    pub premium: i32,
    pub standard: i32,
}

struct ShowSeed {
    movie: usize,
    theatre: usize,
    format: &'static str,
    hours_from_now: i64,
    seats_per_row: u32,
    tier: PriceTier,
}

const SHOWS: &[ShowSeed] = &[
    ShowSeed {
        movie: 0,
        theatre: 0,
        format: "IMAX 2D",
        hours_from_now: 3,
        seats_per_row: 10,
        tier: PriceTier { vip: 500, premium: 350, standard: 200 },
    },
    ShowSeed {
        movie: 1,
        theatre: 0,
        format: "2D",
        hours_from_now: 5,
        seats_per_row: 8,
        tier: PriceTier { vip: 450, premium: 300, standard: 180 },
    },
    ShowSeed {
        movie: 2,
        theatre: 1,
        format: "2D",
        hours_from_now: 7,
        seats_per_row: 8,
        tier: PriceTier { vip: 400, premium: 250, standard: 150 },
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeatSpec {
    pub seat_number: String,
    pub category: SeatCategory,
    pub price: i32,
}

/// Rows A-B are VIP, C-D Premium, the rest Standard. Seats are numbered from 1.
pub fn seat_layout(seats_per_row: u32, tier: PriceTier) -> Vec<SeatSpec> {
    SEAT_ROWS
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            let (category, price) = match i {
                0 | 1 => (SeatCategory::Vip, tier.vip),
                2 | 3 => (SeatCategory::Premium, tier.premium),
                _ => (SeatCategory::Standard, tier.standard),
            };
            (1..=seats_per_row).map(move |n| SeatSpec {
                seat_number: format!("{row}{n}"),
                category,
                price,
            })
        })
        .collect()
}

/// Seeds the demo catalog when there are no movies yet. Returns whether
/// anything was written.
pub async fn seed_if_empty(db: &Database) -> Result<bool, sqlx::Error> {
    let (movies,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies")
        .fetch_one(&db.pool)
        .await?;
    if movies > 0 {
        return Ok(false);
    }

    info!("Seeding database...");
    let mut tx = db.pool.begin().await?;

    let mut movie_ids = Vec::with_capacity(MOVIES.len());
    for m in MOVIES {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO movies (title, genre, duration, rating, description, poster_url, trailer_url, release_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(m.title)
        .bind(m.genre)
        .bind(m.duration)
        .bind(m.rating)
        .bind(m.description)
        .bind(m.poster)
        .bind(m.trailer)
        .bind(NaiveDate::from_ymd_opt(m.released.0, m.released.1, m.released.2))
        .fetch_one(&mut *tx)
        .await?;
        movie_ids.push(id);
    }

    let mut theatre_ids = Vec::with_capacity(THEATRES.len());
    for (name, city, location, screens) in THEATRES {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO theatres (name, city, location, total_screens) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(*name)
        .bind(*city)
        .bind(*location)
        .bind(*screens)
        .fetch_one(&mut *tx)
        .await?;
        theatre_ids.push(id);
    }

    for (name, price, image) in SNACKS {
        sqlx::query("INSERT INTO snacks (name, price, image_url) VALUES ($1, $2, $3)")
            .bind(*name)
            .bind(*price)
            .bind(*image)
            .execute(&mut *tx)
            .await?;
    }

    let now = Utc::now().naive_utc();
    for show in SHOWS {
        let starts: NaiveDateTime = now + Duration::hours(show.hours_from_now);
        let (show_id,): (i32,) = sqlx::query_as(
            "INSERT INTO shows (movie_id, theatre_id, show_time, format) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(movie_ids[show.movie])
        .bind(theatre_ids[show.theatre])
        .bind(starts)
        .bind(show.format)
        .fetch_one(&mut *tx)
        .await?;

        insert_seats(&mut tx, show_id, &seat_layout(show.seats_per_row, show.tier)).await?;
    }

    tx.commit().await?;
    info!(movies = MOVIES.len(), shows = SHOWS.len(), "Database seeded");
    Ok(true)
}

async fn insert_seats(
    tx: &mut Transaction<'_, Postgres>,
    show_id: i32,
    seats: &[SeatSpec],
) -> Result<(), sqlx::Error> {
    let numbers: Vec<&str> = seats.iter().map(|s| s.seat_number.as_str()).collect();
    let categories: Vec<&str> = seats.iter().map(|s| s.category.as_str()).collect();
    let prices: Vec<i32> = seats.iter().map(|s| s.price).collect();

    sqlx::query(
        "INSERT INTO seats (show_id, seat_number, category, price, status)
         SELECT $1, s.seat_number, s.category, s.price, 'available'
         FROM UNNEST($2::TEXT[], $3::TEXT[], $4::INT[]) AS s(seat_number, category, price)",
    )
    .bind(show_id)
    .bind(&numbers)
    .bind(&categories)
    .bind(&prices)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
