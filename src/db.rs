//! SQLite connection handling and schema migrations

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Shared database handle
#[derive(Debug, Clone)]
pub struct Database {
	pool: SqlitePool,
}

impl Database {
	/// Connect to the database at `url`, creating the file if needed
	pub async fn connect(url: &str) -> Result<Self> {
		let options = SqliteConnectOptions::from_str(url)?
			.create_if_missing(true)
			.foreign_keys(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(options)
			.await?;
		tracing::info!(url, "database connected");
		Ok(Self { pool })
	}

	/// Fresh private in-memory database
	///
	/// Every SQLite in-memory connection is its own database, so the pool is
	/// pinned to a single connection that is never recycled.
	pub async fn connect_in_memory() -> Result<Self> {
		let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
		let pool = SqlitePoolOptions::new()
			.min_connections(1)
			.max_connections(1)
			.idle_timeout(None::<Duration>)
			.max_lifetime(None::<Duration>)
			.connect_with(options)
			.await?;
		Ok(Self { pool })
	}

	/// Apply pending migrations
	pub async fn migrate(&self) -> Result<()> {
		MIGRATOR.run(&self.pool).await?;
		tracing::info!("migrations applied");
		Ok(())
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}
