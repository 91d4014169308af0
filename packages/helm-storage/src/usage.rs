use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{
	Result,
	models::{DailyCostRow, UsageGroupRow, UsageRow},
};

/// Atomic increment-or-insert for one (service, model, day) bucket. The arithmetic runs
/// server-side in a single statement, so concurrent callers targeting the same bucket never
/// lose an update.
pub async fn increment_usage<'e, E>(
	executor: E,
	service_name: &str,
	model_string: &str,
	period_start: OffsetDateTime,
	period_end: OffsetDateTime,
	tokens: i64,
	cost: f64,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO model_usage (
	service_name,
	model_string,
	period_start,
	period_end,
	request_count,
	total_tokens,
	estimated_cost
)
VALUES ($1, $2, $3, $4, 1, $5, $6)
ON CONFLICT (service_name, model_string, period_start) DO UPDATE
SET
	request_count = model_usage.request_count + 1,
	total_tokens = model_usage.total_tokens + EXCLUDED.total_tokens,
	estimated_cost = model_usage.estimated_cost + EXCLUDED.estimated_cost",
	)
	.bind(service_name)
	.bind(model_string)
	.bind(period_start)
	.bind(period_end)
	.bind(tokens)
	.bind(cost)
	.execute(executor)
	.await?;

	Ok(())
}

/// Per-day aggregates across all services from `start_date` to now, newest first.
pub async fn daily_costs<'e, E>(executor: E, start_date: OffsetDateTime) -> Result<Vec<DailyCostRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DailyCostRow>(
		"\
SELECT
	period_start,
	sum(request_count)::bigint AS request_count,
	sum(total_tokens)::bigint AS total_tokens,
	sum(estimated_cost)::double precision AS estimated_cost
FROM model_usage
WHERE period_start >= $1
GROUP BY period_start
ORDER BY period_start DESC",
	)
	.bind(start_date)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UsageTotalsRow {
	pub request_count: i64,
	pub total_tokens: i64,
	pub estimated_cost: f64,
}

pub async fn totals<'e, E>(executor: E, service_name: Option<&str>) -> Result<UsageTotalsRow>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, UsageTotalsRow>(
		"\
SELECT
	COALESCE(sum(request_count), 0)::bigint AS request_count,
	COALESCE(sum(total_tokens), 0)::bigint AS total_tokens,
	COALESCE(sum(estimated_cost), 0)::double precision AS estimated_cost
FROM model_usage
WHERE ($1::text IS NULL OR service_name = $1)",
	)
	.bind(service_name)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

pub async fn totals_by_model<'e, E>(
	executor: E,
	service_name: Option<&str>,
) -> Result<Vec<UsageGroupRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, UsageGroupRow>(
		"\
SELECT
	model_string AS group_key,
	sum(request_count)::bigint AS request_count,
	sum(total_tokens)::bigint AS total_tokens,
	sum(estimated_cost)::double precision AS estimated_cost
FROM model_usage
WHERE ($1::text IS NULL OR service_name = $1)
GROUP BY model_string
ORDER BY estimated_cost DESC",
	)
	.bind(service_name)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn totals_by_service<'e, E>(executor: E) -> Result<Vec<UsageGroupRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, UsageGroupRow>(
		"\
SELECT
	service_name AS group_key,
	sum(request_count)::bigint AS request_count,
	sum(total_tokens)::bigint AS total_tokens,
	sum(estimated_cost)::double precision AS estimated_cost
FROM model_usage
GROUP BY service_name
ORDER BY estimated_cost DESC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn cost_since<'e, E>(executor: E, since: OffsetDateTime) -> Result<f64>
where
	E: PgExecutor<'e>,
{
	let cost = sqlx::query_scalar::<_, f64>(
		"\
SELECT COALESCE(sum(estimated_cost), 0)::double precision
FROM model_usage
WHERE period_start >= $1",
	)
	.bind(since)
	.fetch_one(executor)
	.await?;

	Ok(cost)
}

pub async fn bucket<'e, E>(
	executor: E,
	service_name: &str,
	model_string: &str,
	period_start: OffsetDateTime,
) -> Result<Option<UsageRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, UsageRow>(
		"\
SELECT * FROM model_usage
WHERE service_name = $1 AND model_string = $2 AND period_start = $3
LIMIT 1",
	)
	.bind(service_name)
	.bind(model_string)
	.bind(period_start)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}
