//! `SQLite` database for the `RecipeBox` server.

use std::path::Path;

use recipebox_core::db::{self, DatabaseError};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Users and recipes. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct RecipeDatabase {
    pool: Pool<Sqlite>,
}

impl RecipeDatabase {
    /// Open or create the database file and bring its schema up to date.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::migrated(db::open_pool(path).await?).await
    }

    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(db::open_pool_in_memory().await?).await
    }

    async fn migrated(pool: Pool<Sqlite>) -> Result<Self, DatabaseError> {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Recipe database migrations complete");
        Ok(Self { pool })
    }

    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
