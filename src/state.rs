use std::sync::Arc;
use crate::domain::ports::{
    BookingRepository, DeliveryLogRepository, EmailService, JobRepository,
    SessionRepository, TicketArchive, TicketSender, UserRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::fanout::FanoutHub;
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub delivery_repo: Arc<dyn DeliveryLogRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub auth_service: Arc<AuthService>,
    pub ticket_sender: Arc<dyn TicketSender>,
    pub email_service: Arc<dyn EmailService>,
    pub ticket_archive: Arc<dyn TicketArchive>,
    pub fanout: Arc<FanoutHub>,
    pub templates: Arc<Tera>,
}
