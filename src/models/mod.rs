pub mod booking;
pub mod movie;
pub mod seat;
pub mod show;
pub mod snack;
pub mod theatre;
pub mod user;

pub use booking::{Booking, BookingDetails, BookingSnackLine, CreateBookingRequest, PaymentStatus, SnackItem};
pub use movie::Movie;
pub use seat::{Seat, SeatCategory, SeatStatus, UpdateSeatStatusRequest};
pub use show::{Show, ShowWithTheatre};
pub use snack::Snack;
pub use theatre::Theatre;
pub use user::{LoginRequest, SignupRequest, User};

/// A string column held a value outside the enumeration it maps to.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
