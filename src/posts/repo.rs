//! Persistence for posts, like counters and the feed.

use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Post, PostId, PostInput, PostRow};
use crate::{db::db_id, error::RepoError, users::repo_types::UserId};

#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn create(&self, author: UserId, input: &PostInput) -> Result<Post, RepoError>;
    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError>;
    /// Own posts plus posts of every followed author, each post at most once.
    async fn list_feed(&self, user: UserId) -> Result<Vec<Post>, RepoError>;
    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, RepoError>;
    /// Rewrites title and content when `author` owns the post.
    async fn update(&self, id: PostId, author: UserId, input: &PostInput)
        -> Result<(), RepoError>;
    async fn delete(&self, id: PostId, author: UserId) -> Result<(), RepoError>;
    async fn like(&self, id: PostId) -> Result<(), RepoError>;
    /// Decrements the counter, never below zero.
    async fn unlike(&self, id: PostId) -> Result<(), RepoError>;
}

#[derive(Clone)]
pub struct PgPostRepo {
    db: PgPool,
}

impl PgPostRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Explains why an ownership-guarded write touched no rows.
    async fn classify_miss(&self, id: i64) -> Result<(), RepoError> {
        let owner = sqlx::query_scalar::<_, i64>(r#"SELECT autor_id FROM publicacoes WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        match owner {
            Some(_) => Err(RepoError::NotOwner),
            None => Err(RepoError::NotFound),
        }
    }
}

const POST_COLUMNS: &str =
    "p.id, p.titulo, p.conteudo, p.autor_id, p.curtidas, p.criada_em, u.nick AS autor_nick";

#[async_trait]
impl PostRepo for PgPostRepo {
    async fn create(&self, author: UserId, input: &PostInput) -> Result<Post, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            WITH p AS (
                INSERT INTO publicacoes (titulo, conteudo, autor_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            INNER JOIN usuarios u ON u.id = p.autor_id
            "#
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(db_id(author)?)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_db)?;
        Ok(row.into())
    }

    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let Ok(key) = db_id(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM publicacoes p
            INNER JOIN usuarios u ON u.id = p.autor_id
            WHERE p.id = $1
            "#
        ))
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Post::from))
    }

    async fn list_feed(&self, user: UserId) -> Result<Vec<Post>, RepoError> {
        let Ok(key) = db_id(user) else {
            return Ok(Vec::new());
        };
        // One row per (post, follower of its author) before DISTINCT.
        // LEFT JOIN keeps own posts of authors nobody follows.
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT DISTINCT {POST_COLUMNS}
            FROM publicacoes p
            INNER JOIN usuarios u ON u.id = p.autor_id
            LEFT JOIN seguidores s ON s.usuario_id = p.autor_id
            WHERE p.autor_id = $1 OR s.seguidor_id = $1
            ORDER BY p.criada_em DESC, p.id DESC
            "#
        ))
        .bind(key)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_by_author(&self, author: UserId) -> Result<Vec<Post>, RepoError> {
        let Ok(key) = db_id(author) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM publicacoes p
            INNER JOIN usuarios u ON u.id = p.autor_id
            WHERE p.autor_id = $1
            ORDER BY p.criada_em DESC, p.id DESC
            "#
        ))
        .bind(key)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn update(
        &self,
        id: PostId,
        author: UserId,
        input: &PostInput,
    ) -> Result<(), RepoError> {
        let key = db_id(id)?;
        let res = sqlx::query(
            r#"
            UPDATE publicacoes
               SET titulo = $1, conteudo = $2
             WHERE id = $3 AND autor_id = $4
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(key)
        .bind(db_id(author)?)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return self.classify_miss(key).await;
        }
        Ok(())
    }

    async fn delete(&self, id: PostId, author: UserId) -> Result<(), RepoError> {
        let key = db_id(id)?;
        let res = sqlx::query(r#"DELETE FROM publicacoes WHERE id = $1 AND autor_id = $2"#)
            .bind(key)
            .bind(db_id(author)?)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return self.classify_miss(key).await;
        }
        Ok(())
    }

    async fn like(&self, id: PostId) -> Result<(), RepoError> {
        let res = sqlx::query(r#"UPDATE publicacoes SET curtidas = curtidas + 1 WHERE id = $1"#)
            .bind(db_id(id)?)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn unlike(&self, id: PostId) -> Result<(), RepoError> {
        let res = sqlx::query(
            r#"UPDATE publicacoes SET curtidas = GREATEST(curtidas - 1, 0) WHERE id = $1"#,
        )
        .bind(db_id(id)?)
        .execute(&self.db)
        .await?;
        if res.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
