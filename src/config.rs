use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub whatsapp_api_url: String,
    pub whatsapp_api_token: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub ticket_archive_dir: String,
    pub event_name: String,
    pub seat_price_cents: i64,
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            whatsapp_api_url: env::var("WHATSAPP_API_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1/messages".to_string()),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            ticket_archive_dir: env::var("TICKET_ARCHIVE_DIR").unwrap_or_else(|_| "./tickets".to_string()),
            event_name: env::var("EVENT_NAME").unwrap_or_else(|_| "University Gala Night".to_string()),
            seat_price_cents: env::var("SEAT_PRICE_CENTS").unwrap_or_else(|_| "2500".to_string()).parse().expect("SEAT_PRICE_CENTS must be a number"),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set"),
        }
    }
}
