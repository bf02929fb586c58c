pub mod auth_service;
pub mod delivery_service;
pub mod fanout;
pub mod retry;
pub mod seating;
