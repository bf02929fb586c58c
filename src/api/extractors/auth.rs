use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use crate::error::AppError;
use crate::state::AppState;
use crate::domain::models::user::User;
use std::sync::Arc;
use tracing::Span;

pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let user = app_state.auth_service.authenticate(&token).await?;

        Span::current().record("user_id", user.id.as_str());

        Ok(AdminUser(user))
    }
}

pub fn bearer_token(parts: &Parts) -> Option<String> {
    parts.headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
}
