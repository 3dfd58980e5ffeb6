use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub type UserId = u64;

/// Row shape of `usuarios` without the password column.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub nome: String,
    pub nick: String,
    pub email: String,
    pub criado_em: OffsetDateTime,
}

/// Public account data. The password hash never lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "nome")]
    pub name: String,
    pub nick: String,
    pub email: String,
    #[serde(rename = "criadoEm", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id as UserId,
            name: r.nome,
            nick: r.nick,
            email: r.email,
            created_at: r.criado_em,
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub nick: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub profile: UserProfile,
    pub password_hash: String,
}

/// Login lookup result.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub id: UserId,
    pub password_hash: String,
}
