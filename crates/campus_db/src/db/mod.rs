use anyhow::{Context, Result};

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub mod roster;

#[derive(Debug)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    pub async fn new() -> Result<Self> {
        let url = std::env::var("DATABASE_URL").context("Missing environment variable DATABASE_URL")?;
        let pool = SqlitePool::connect(&url).await?;
        Ok(Self { pool })
    }

    /// Single-connection in-memory database, every connection of a pool would otherwise get its own.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}
