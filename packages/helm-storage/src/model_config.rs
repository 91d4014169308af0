use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::ModelConfigRow};

pub struct ModelConfigUpsert<'a> {
	pub service_name: &'a str,
	pub model_string: &'a str,
	pub temperature: f32,
	pub max_tokens: Option<i32>,
	pub embedding_dimensions: Option<i32>,
	pub batch_size: Option<i32>,
	pub supports_dimensions_param: Option<bool>,
	pub optimal_batch_size: Option<i32>,
	pub cost_per_million_tokens: Option<f64>,
	pub max_input_tokens: Option<i32>,
	pub updated_by: &'a str,
	pub updated_at: OffsetDateTime,
}

pub async fn upsert_config<'e, E>(
	executor: E,
	config: &ModelConfigUpsert<'_>,
) -> Result<ModelConfigRow>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ModelConfigRow>(
		"\
INSERT INTO model_config (
	service_name,
	model_string,
	temperature,
	max_tokens,
	embedding_dimensions,
	batch_size,
	supports_dimensions_param,
	optimal_batch_size,
	cost_per_million_tokens,
	max_input_tokens,
	updated_at,
	updated_by
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
ON CONFLICT (service_name) DO UPDATE
SET
	model_string = EXCLUDED.model_string,
	temperature = EXCLUDED.temperature,
	max_tokens = EXCLUDED.max_tokens,
	embedding_dimensions = EXCLUDED.embedding_dimensions,
	batch_size = EXCLUDED.batch_size,
	supports_dimensions_param = EXCLUDED.supports_dimensions_param,
	optimal_batch_size = EXCLUDED.optimal_batch_size,
	cost_per_million_tokens = EXCLUDED.cost_per_million_tokens,
	max_input_tokens = EXCLUDED.max_input_tokens,
	updated_at = EXCLUDED.updated_at,
	updated_by = EXCLUDED.updated_by
RETURNING *",
	)
	.bind(config.service_name)
	.bind(config.model_string)
	.bind(config.temperature)
	.bind(config.max_tokens)
	.bind(config.embedding_dimensions)
	.bind(config.batch_size)
	.bind(config.supports_dimensions_param)
	.bind(config.optimal_batch_size)
	.bind(config.cost_per_million_tokens)
	.bind(config.max_input_tokens)
	.bind(config.updated_at)
	.bind(config.updated_by)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

pub async fn get_config<'e, E>(executor: E, service_name: &str) -> Result<Option<ModelConfigRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ModelConfigRow>(
		"SELECT * FROM model_config WHERE service_name = $1 LIMIT 1",
	)
	.bind(service_name)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list_configs<'e, E>(executor: E) -> Result<Vec<ModelConfigRow>>
where
	E: PgExecutor<'e>,
{
	let rows =
		sqlx::query_as::<_, ModelConfigRow>("SELECT * FROM model_config ORDER BY service_name")
			.fetch_all(executor)
			.await?;

	Ok(rows)
}

pub async fn delete_config<'e, E>(executor: E, service_name: &str) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM model_config WHERE service_name = $1")
		.bind(service_name)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}
