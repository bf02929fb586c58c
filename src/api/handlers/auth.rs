use axum::{extract::State, http::header::HeaderMap, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::LoginRequest;
use crate::api::dtos::responses::LoginResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.auth_service.login(&payload.username, &payload.password).await?;
    info!("Admin login for '{}'", payload.username);
    Ok(Json(LoginResponse { token }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    state.auth_service.logout(token).await?;
    Ok(Json(json!({ "status": "logged_out" })))
}
