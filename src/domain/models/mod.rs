pub mod seat;
pub mod booking;
pub mod delivery;
pub mod job;
pub mod user;
