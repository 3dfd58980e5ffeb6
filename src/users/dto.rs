use serde::{Deserialize, Serialize};

use super::repo_types::UserId;

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
}

/// Request body for profile edits. The password is changed separately.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    #[serde(default)]
    pub atual: String,
    #[serde(default)]
    pub nova: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub senha: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: UserId,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub usuario: String,
}
