//! Persistence for accounts and the follow graph.
//!
//! Every operation is a single independent statement against the pool.

use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Credentials, NewUser, User, UserId, UserProfile, UserRow};
use crate::{db::db_id, error::RepoError};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User, RepoError>;
    /// Case-insensitive substring match on name or nick.
    async fn search(&self, fragment: &str) -> Result<Vec<User>, RepoError>;
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepoError>;
    /// Overwrites name, nick and email; the password is untouched.
    async fn update(&self, id: UserId, profile: &UserProfile) -> Result<(), RepoError>;
    async fn delete(&self, id: UserId) -> Result<(), RepoError>;
    async fn get_credentials_by_email(&self, email: &str)
        -> Result<Option<Credentials>, RepoError>;
    /// Idempotent: following twice leaves exactly one edge.
    async fn follow(&self, target: UserId, follower: UserId) -> Result<(), RepoError>;
    /// No-op when the edge does not exist.
    async fn unfollow(&self, target: UserId, follower: UserId) -> Result<(), RepoError>;
    async fn list_followers(&self, id: UserId) -> Result<Vec<User>, RepoError>;
    async fn list_following(&self, id: UserId) -> Result<Vec<User>, RepoError>;
    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepoError>;
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE metacharacters so the fragment matches literally.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn expect_row(rows_affected: u64) -> Result<(), RepoError> {
    if rows_affected == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, user: &NewUser) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO usuarios (nome, nick, email, senha)
            VALUES ($1, $2, $3, $4)
            RETURNING id, nome, nick, email, criado_em
            "#,
        )
        .bind(&user.profile.name)
        .bind(&user.profile.nick)
        .bind(&user.profile.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_db)?;
        Ok(row.into())
    }

    async fn search(&self, fragment: &str) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, nome, nick, email, criado_em
            FROM usuarios
            WHERE nome ILIKE $1 OR nick ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(like_pattern(fragment))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let Ok(key) = db_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, nome, nick, email, criado_em FROM usuarios WHERE id = $1"#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update(&self, id: UserId, profile: &UserProfile) -> Result<(), RepoError> {
        let res = sqlx::query(
            r#"UPDATE usuarios SET nome = $1, nick = $2, email = $3 WHERE id = $4"#,
        )
        .bind(&profile.name)
        .bind(&profile.nick)
        .bind(&profile.email)
        .bind(db_id(id)?)
        .execute(&self.db)
        .await
        .map_err(RepoError::from_db)?;
        expect_row(res.rows_affected())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepoError> {
        // posts and follow edges go with the user (ON DELETE CASCADE)
        let res = sqlx::query(r#"DELETE FROM usuarios WHERE id = $1"#)
            .bind(db_id(id)?)
            .execute(&self.db)
            .await?;
        expect_row(res.rows_affected())
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials>, RepoError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            r#"SELECT id, senha FROM usuarios WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(id, password_hash)| Credentials {
            id: id as UserId,
            password_hash,
        }))
    }

    async fn follow(&self, target: UserId, follower: UserId) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO seguidores (usuario_id, seguidor_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(db_id(target)?)
        .bind(db_id(follower)?)
        .execute(&self.db)
        .await
        .map_err(RepoError::from_db)?;
        Ok(())
    }

    async fn unfollow(&self, target: UserId, follower: UserId) -> Result<(), RepoError> {
        let (Ok(target), Ok(follower)) = (db_id(target), db_id(follower)) else {
            return Ok(());
        };
        sqlx::query(r#"DELETE FROM seguidores WHERE usuario_id = $1 AND seguidor_id = $2"#)
            .bind(target)
            .bind(follower)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn list_followers(&self, id: UserId) -> Result<Vec<User>, RepoError> {
        let Ok(key) = db_id(id) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.nome, u.nick, u.email, u.criado_em
            FROM usuarios u
            INNER JOIN seguidores s ON u.id = s.seguidor_id
            WHERE s.usuario_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(key)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_following(&self, id: UserId) -> Result<Vec<User>, RepoError> {
        let Ok(key) = db_id(id) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.nome, u.nick, u.email, u.criado_em
            FROM usuarios u
            INNER JOIN seguidores s ON u.id = s.usuario_id
            WHERE s.seguidor_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(key)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepoError> {
        let Ok(key) = db_id(id) else {
            return Ok(None);
        };
        let hash = sqlx::query_scalar::<_, String>(r#"SELECT senha FROM usuarios WHERE id = $1"#)
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(hash)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepoError> {
        let res = sqlx::query(r#"UPDATE usuarios SET senha = $1 WHERE id = $2"#)
            .bind(password_hash)
            .bind(db_id(id)?)
            .execute(&self.db)
            .await?;
        expect_row(res.rows_affected())
    }
}
