use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub table: i32,
    pub seat: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Copy)]
pub struct SeatRef {
    pub table: i32,
    pub seat: i32,
}

/// Either an explicit seat list or a count of random seats to hold.
#[derive(Deserialize)]
pub struct PrebookRequest {
    pub count: Option<u32>,
    pub seats: Option<Vec<SeatRef>>,
}

#[derive(Deserialize)]
pub struct ReleaseSeatRequest {
    pub table: i32,
    pub seat: i32,
}

#[derive(Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<i64>,
}
