pub mod postgres_booking_repo;
pub mod postgres_delivery_repo;
pub mod postgres_job_repo;
pub mod postgres_session_repo;
pub mod postgres_user_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_delivery_repo;
pub mod sqlite_job_repo;
pub mod sqlite_session_repo;
pub mod sqlite_user_repo;
