use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{config::AppConfig, error::RepoError};

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Converts an API identifier into a BIGINT key. Ids beyond `i64::MAX`
/// can never exist in the store.
pub fn db_id(id: u64) -> Result<i64, RepoError> {
    i64::try_from(id).map_err(|_| RepoError::NotFound)
}
