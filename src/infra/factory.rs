use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::fanout::FanoutHub;
use crate::infra::archive::fs_ticket_archive::FsTicketArchive;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::whatsapp::http_whatsapp_service::HttpWhatsappService;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_delivery_repo::PostgresDeliveryRepo,
    postgres_job_repo::PostgresJobRepo, postgres_session_repo::PostgresSessionRepo,
    postgres_user_repo::PostgresUserRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_delivery_repo::SqliteDeliveryRepo,
    sqlite_job_repo::SqliteJobRepo, sqlite_session_repo::SqliteSessionRepo,
    sqlite_user_repo::SqliteUserRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let ticket_sender = Arc::new(HttpWhatsappService::new(
        config.whatsapp_api_url.clone(),
        config.whatsapp_api_token.clone(),
    ));
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let ticket_archive = Arc::new(FsTicketArchive::new(config.ticket_archive_dir.clone()));

    let mut tera = Tera::default();
    tera.add_raw_template("ticket_message.txt", include_str!("../templates/ticket_message.txt"))
        .expect("Failed to load ticket message template");
    let templates = Arc::new(tera);

    let fanout = Arc::new(FanoutHub::default());

    let state = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let user_repo = Arc::new(PostgresUserRepo::new(pool.clone()));
        let session_repo = Arc::new(PostgresSessionRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(user_repo.clone(), session_repo.clone()));

        AppState {
            config: config.clone(),
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
            job_repo: Arc::new(PostgresJobRepo::new(pool.clone())),
            delivery_repo: Arc::new(PostgresDeliveryRepo::new(pool.clone())),
            user_repo,
            session_repo,
            auth_service,
            ticket_sender,
            email_service,
            ticket_archive,
            fanout,
            templates,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
        let session_repo = Arc::new(SqliteSessionRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(user_repo.clone(), session_repo.clone()));

        AppState {
            config: config.clone(),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            job_repo: Arc::new(SqliteJobRepo::new(pool.clone())),
            delivery_repo: Arc::new(SqliteDeliveryRepo::new(pool.clone())),
            user_repo,
            session_repo,
            auth_service,
            ticket_sender,
            email_service,
            ticket_archive,
            fanout,
            templates,
        }
    };

    state.auth_service
        .ensure_admin(&config.admin_username, &config.admin_password)
        .await
        .expect("Failed to seed admin user");

    state
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
