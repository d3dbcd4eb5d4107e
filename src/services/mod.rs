pub mod booking;
pub mod catalog;
pub mod seats;
pub mod seed;
pub mod users;
