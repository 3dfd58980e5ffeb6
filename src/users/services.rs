use lazy_static::lazy_static;
use regex::Regex;

use super::repo_types::UserProfile;
use crate::error::ApiError;

const MAX_FIELD_CHARS: usize = 50;
pub const MIN_PASSWORD_CHARS: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {MAX_FIELD_CHARS} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trims and validates profile fields.
pub fn prepare_profile(nome: &str, nick: &str, email: &str) -> Result<UserProfile, ApiError> {
    let name = required("nome", nome)?;
    let nick = required("nick", nick)?;
    let email = required("email", &normalize_email(email))?;
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    Ok(UserProfile { name, nick, email })
}

pub fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest("password too short".into()));
    }
    Ok(())
}
