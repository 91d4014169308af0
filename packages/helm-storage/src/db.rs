use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema, vectors::DimensionMap};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &helm_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Bootstraps the metadata tables plus one vector store per provisioned dimension.
	/// Adding a width to the configuration and re-running this is the whole provisioning
	/// procedure; no per-width code exists.
	pub async fn ensure_schema(&self, dimensions: &DimensionMap) -> Result<()> {
		let sql = schema::render_schema(dimensions);
		let lock_id: i64 = 8_215_113;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
