use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::AvailableModelRow};

pub struct ModelSync<'a> {
	pub provider: &'a str,
	pub model_id: &'a str,
	pub display_name: &'a str,
	pub description: Option<&'a str>,
	pub context_length: Option<i32>,
	pub input_cost: Option<f64>,
	pub output_cost: Option<f64>,
	pub supports_vision: bool,
	pub supports_tools: bool,
	pub supports_reasoning: bool,
	pub is_embedding: bool,
	pub is_free: bool,
	pub cost_tier: &'a str,
	pub source: &'a str,
	pub now: OffsetDateTime,
}

/// Idempotent upsert keyed by (provider, model_id). Always refreshes `last_updated` and forces
/// `is_active = TRUE`, so a model that reappears upstream comes back from a prior staleness
/// sweep on its own.
pub async fn sync_model<'e, E>(executor: E, model: &ModelSync<'_>) -> Result<AvailableModelRow>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, AvailableModelRow>(
		"\
INSERT INTO available_models (
	provider,
	model_id,
	model_string,
	display_name,
	description,
	context_length,
	input_cost,
	output_cost,
	supports_vision,
	supports_tools,
	supports_reasoning,
	is_embedding,
	is_free,
	cost_tier,
	is_active,
	source,
	last_updated
)
VALUES ($1, $2, $1 || ':' || $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, TRUE, $14, $15)
ON CONFLICT (provider, model_id) DO UPDATE
SET
	display_name = EXCLUDED.display_name,
	description = EXCLUDED.description,
	context_length = EXCLUDED.context_length,
	input_cost = EXCLUDED.input_cost,
	output_cost = EXCLUDED.output_cost,
	supports_vision = EXCLUDED.supports_vision,
	supports_tools = EXCLUDED.supports_tools,
	supports_reasoning = EXCLUDED.supports_reasoning,
	is_embedding = EXCLUDED.is_embedding,
	is_free = EXCLUDED.is_free,
	cost_tier = EXCLUDED.cost_tier,
	is_active = TRUE,
	source = EXCLUDED.source,
	last_updated = EXCLUDED.last_updated
RETURNING *",
	)
	.bind(model.provider)
	.bind(model.model_id)
	.bind(model.display_name)
	.bind(model.description)
	.bind(model.context_length)
	.bind(model.input_cost)
	.bind(model.output_cost)
	.bind(model.supports_vision)
	.bind(model.supports_tools)
	.bind(model.supports_reasoning)
	.bind(model.is_embedding)
	.bind(model.is_free)
	.bind(model.cost_tier)
	.bind(model.source)
	.bind(model.now)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

/// The staleness sweep compiled to one statement: deactivate rows of this source whose
/// `last_updated` precedes the pass start. See `helm_domain::catalog::is_stale` for the
/// predicate in isolation.
pub async fn deactivate_stale<'e, E>(
	executor: E,
	source: &str,
	sync_started_at: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE available_models
SET is_active = FALSE
WHERE source = $1 AND last_updated < $2 AND is_active",
	)
	.bind(source)
	.bind(sync_started_at)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

#[derive(Clone, Debug, Default)]
pub struct ModelFilters {
	pub provider: Option<String>,
	pub embedding_only: bool,
	pub active_only: bool,
}

pub async fn list_models<'e, E>(executor: E, filters: &ModelFilters) -> Result<Vec<AvailableModelRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, AvailableModelRow>(
		"\
SELECT * FROM available_models
WHERE ($1::text IS NULL OR provider = $1)
	AND ($2::bool IS FALSE OR is_embedding)
	AND ($3::bool IS FALSE OR is_active)
ORDER BY provider, cost_tier, display_name",
	)
	.bind(filters.provider.as_deref())
	.bind(filters.embedding_only)
	.bind(filters.active_only)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn get_model<'e, E>(
	executor: E,
	provider: &str,
	model_id: &str,
) -> Result<Option<AvailableModelRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, AvailableModelRow>(
		"SELECT * FROM available_models WHERE provider = $1 AND model_id = $2 LIMIT 1",
	)
	.bind(provider)
	.bind(model_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}
