use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use super::password::verify_password;
use crate::{
    error::ApiError,
    extract::AppJson,
    state::AppState,
    users::{
        dto::{LoginRequest, LoginResponse},
        services::{is_valid_email, normalize_email},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("invalid credentials".into())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("invalid email".into()));
    }

    let Some(creds) = state.users.get_credentials_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credentials());
    };

    let ok = verify_password(&payload.senha, &creds.password_hash).map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = creds.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let token = state.keys.sign(creds.id).map_err(ApiError::internal)?;
    info!(user_id = creds.id, "user logged in");
    Ok(Json(LoginResponse {
        id: creds.id,
        token,
    }))
}
