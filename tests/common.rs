use ticketing_backend::{
    api::router::create_router,
    config::Config,
    domain::models::booking::{Booking, NewBookingParams},
    domain::models::delivery::{ProviderReceipt, SendError, TicketArtifact},
    domain::models::job::Job,
    domain::models::seat::SeatId,
    domain::ports::{EmailService, TicketArchive, TicketSender},
    domain::services::auth_service::AuthService,
    domain::services::fanout::FanoutHub,
    error::AppError,
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_delivery_repo::SqliteDeliveryRepo,
        sqlite_job_repo::SqliteJobRepo,
        sqlite_session_repo::SqliteSessionRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tera::Tera;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-secret";

#[allow(dead_code)]
pub enum ScriptedSend {
    Ok,
    Transient,
    Permanent,
}

/// Scripted WhatsApp provider. Consumes the script front-to-back, then
/// succeeds for every further call.
pub struct MockTicketSender {
    pub calls: Mutex<Vec<String>>,
    script: Mutex<VecDeque<ScriptedSend>>,
    counter: AtomicU32,
}

#[allow(dead_code)]
impl MockTicketSender {
    pub fn new() -> Self {
        Self::scripted(vec![])
    }

    pub fn scripted(script: Vec<ScriptedSend>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(script.into()),
            counter: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TicketSender for MockTicketSender {
    async fn send_ticket(&self, phone: &str, _artifact: &TicketArtifact) -> Result<ProviderReceipt, SendError> {
        self.calls.lock().unwrap().push(phone.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(ScriptedSend::Transient) => Err(SendError::Transient("provider returned 503".into())),
            Some(ScriptedSend::Permanent) => Err(SendError::Permanent("number unreachable".into())),
            Some(ScriptedSend::Ok) | None => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst);
                Ok(ProviderReceipt { message_id: format!("wamid-{}", n) })
            }
        }
    }
}

pub struct MockEmailService {
    pub sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl MockEmailService {
    pub fn new() -> Self {
        Self { sent: Mutex::new(Vec::new()), fail: AtomicBool::new(false) }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _html_body: &str,
        _attachment_name: Option<&str>,
        _attachment_data: Option<&[u8]>,
    ) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("mail service down".into()));
        }
        self.sent.lock().unwrap().push((recipient.to_string(), subject.to_string()));
        Ok(())
    }
}

pub struct MockArchive {
    pub stored: Mutex<Vec<TicketArtifact>>,
}

#[allow(dead_code)]
impl MockArchive {
    pub fn new() -> Self {
        Self { stored: Mutex::new(Vec::new()) }
    }

    pub fn stored_count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl TicketArchive for MockArchive {
    async fn store(&self, artifact: &TicketArtifact) -> Result<String, AppError> {
        self.stored.lock().unwrap().push(artifact.clone());
        Ok(format!("/tmp/tickets/{}.json", artifact.ticket_id))
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub sender: Arc<MockTicketSender>,
    pub email: Arc<MockEmailService>,
    pub archive: Arc<MockArchive>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut tera = Tera::default();
        tera.add_raw_template(
            "ticket_message.txt",
            "{{ event_name }}: ticket {{ ticket_id }} for {{ holder_name }}, seat {{ seat }}",
        ).unwrap();
        let templates = Arc::new(tera);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            whatsapp_api_url: "http://localhost".to_string(),
            whatsapp_api_token: "token".to_string(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            ticket_archive_dir: "./tickets-test".to_string(),
            event_name: "Test Gala".to_string(),
            seat_price_cents: 2500,
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
        };

        let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
        let session_repo = Arc::new(SqliteSessionRepo::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(user_repo.clone(), session_repo.clone()));
        auth_service.ensure_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Failed to seed admin user");

        let sender = Arc::new(MockTicketSender::new());
        let email = Arc::new(MockEmailService::new());
        let archive = Arc::new(MockArchive::new());

        let state = Arc::new(AppState {
            config,
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            job_repo: Arc::new(SqliteJobRepo::new(pool.clone())),
            delivery_repo: Arc::new(SqliteDeliveryRepo::new(pool.clone())),
            user_repo,
            session_repo,
            auth_service,
            ticket_sender: sender.clone(),
            email_service: email.clone(),
            ticket_archive: archive.clone(),
            fanout: Arc::new(FanoutHub::default()),
            templates,
        });

        // No background worker here: tests drive the job queue explicitly
        // so job-count assertions stay deterministic.
        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, sender, email, archive }
    }

    pub async fn login(&self) -> String {
        let (status, body) = self.post_json(
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
        ).await;
        assert_eq!(status, StatusCode::OK, "Login failed in test helper: {}", body);
        body["token"].as_str().expect("No token in login response").to_string()
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    /// Creates a booking through the API and returns its id.
    pub async fn create_booking(&self, table: i32, seat: i32, phone: &str) -> String {
        let (status, body) = self.post_json("/api/v1/bookings", None, serde_json::json!({
            "table": table,
            "seat": seat,
            "first_name": "Test",
            "last_name": "Guest",
            "phone": phone,
        })).await;
        assert_eq!(status, StatusCode::CREATED, "create_booking helper failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

/// Seeds a PAID booking straight through the repository layer, bypassing
/// request validation. Used by delivery pipeline tests.
#[allow(dead_code)]
pub async fn paid_booking(
    state: &AppState,
    table: i32,
    seat: i32,
    phone: &str,
    email: Option<&str>,
) -> Booking {
    let booking = Booking::new(NewBookingParams {
        seat: SeatId::new(table, seat).unwrap(),
        first_name: "Test".into(),
        last_name: "Guest".into(),
        phone: phone.into(),
        email: email.map(|e| e.to_string()),
        price_cents: 2500,
    });
    // Repo-level create skips phone validation on purpose.
    let created = state.booking_repo.create(&booking).await.unwrap();

    let ticket_id = format!("TKT-{}", &created.id[..8]);
    let job = Job::ticket_delivery(created.id.clone(), Utc::now());
    let outcome = state.booking_repo.confirm_payment(&created.id, &ticket_id, job).await.unwrap();
    outcome.booking().clone()
}

#[allow(dead_code)]
pub fn artifact_for(booking: &Booking) -> TicketArtifact {
    TicketArtifact {
        ticket_id: booking.ticket_id.clone().unwrap(),
        booking_id: booking.id.clone(),
        event_name: "Test Gala".into(),
        holder_name: booking.holder_name(),
        seat: booking.seat_label(),
        message: format!("Ticket {} for {}", booking.ticket_id.as_deref().unwrap_or(""), booking.seat_label()),
    }
}
