use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::users::repo_types::UserId;

pub type PostId = u64;

/// `publicacoes` joined with the author's nick.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub titulo: String,
    pub conteudo: String,
    pub autor_id: i64,
    pub curtidas: i32,
    pub criada_em: OffsetDateTime,
    pub autor_nick: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "conteudo")]
    pub content: String,
    #[serde(rename = "autorId")]
    pub author_id: UserId,
    /// Filled from the author row on read, never stored on the post.
    #[serde(rename = "autorNick")]
    pub author_nick: String,
    #[serde(rename = "curtidas")]
    pub likes: u32,
    #[serde(rename = "criadaEm", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Self {
            id: r.id as PostId,
            title: r.titulo,
            content: r.conteudo,
            author_id: r.autor_id as UserId,
            author_nick: r.autor_nick,
            likes: r.curtidas.max(0) as u32,
            created_at: r.criada_em,
        }
    }
}

/// Author-editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
}
