use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::ServiceRegistryRow};

/// Fields produced by registry derivation from a model configuration write.
pub struct DerivedEntry<'a> {
	pub service_name: &'a str,
	pub display_name: &'a str,
	pub description: &'a str,
	pub icon: &'a str,
	pub category: &'a str,
	pub service_type: &'a str,
	pub model_type: &'a str,
	pub location: &'a str,
	pub supports_temperature: bool,
	pub supports_max_tokens: bool,
	pub default_model: &'a str,
	pub owner_team: &'a str,
	pub now: OffsetDateTime,
}

/// Derivation upsert: a fresh row gets the full classified shape; an existing row keeps every
/// operator-edited display field and takes only the new `default_model` and `updated_at`.
pub async fn upsert_derived<'e, E>(executor: E, entry: &DerivedEntry<'_>) -> Result<ServiceRegistryRow>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ServiceRegistryRow>(
		"\
INSERT INTO service_registry (
	service_name,
	display_name,
	description,
	icon,
	category,
	service_type,
	model_type,
	location,
	supports_temperature,
	supports_max_tokens,
	default_model,
	owner_team,
	first_seen,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13, $13)
ON CONFLICT (service_name) DO UPDATE
SET
	default_model = EXCLUDED.default_model,
	updated_at = EXCLUDED.updated_at
RETURNING *",
	)
	.bind(entry.service_name)
	.bind(entry.display_name)
	.bind(entry.description)
	.bind(entry.icon)
	.bind(entry.category)
	.bind(entry.service_type)
	.bind(entry.model_type)
	.bind(entry.location)
	.bind(entry.supports_temperature)
	.bind(entry.supports_max_tokens)
	.bind(entry.default_model)
	.bind(entry.owner_team)
	.bind(entry.now)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

/// Direct registration. Unlike derivation, this is an operator write and replaces the display
/// fields.
pub struct Registration<'a> {
	pub service_name: &'a str,
	pub display_name: &'a str,
	pub description: Option<&'a str>,
	pub icon: Option<&'a str>,
	pub category: &'a str,
	pub service_type: &'a str,
	pub model_type: &'a str,
	pub location: Option<&'a str>,
	pub supports_temperature: bool,
	pub supports_max_tokens: bool,
	pub default_model: Option<&'a str>,
	pub cost_profile: &'a str,
	pub owner_team: Option<&'a str>,
	pub contact_email: Option<&'a str>,
	pub documentation_url: Option<&'a str>,
	pub now: OffsetDateTime,
}

pub async fn register<'e, E>(executor: E, registration: &Registration<'_>) -> Result<ServiceRegistryRow>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ServiceRegistryRow>(
		"\
INSERT INTO service_registry (
	service_name,
	display_name,
	description,
	icon,
	category,
	service_type,
	model_type,
	location,
	supports_temperature,
	supports_max_tokens,
	default_model,
	cost_profile,
	owner_team,
	contact_email,
	documentation_url,
	first_seen,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16, $16)
ON CONFLICT (service_name) DO UPDATE
SET
	display_name = EXCLUDED.display_name,
	description = EXCLUDED.description,
	icon = EXCLUDED.icon,
	category = EXCLUDED.category,
	service_type = EXCLUDED.service_type,
	model_type = EXCLUDED.model_type,
	location = EXCLUDED.location,
	supports_temperature = EXCLUDED.supports_temperature,
	supports_max_tokens = EXCLUDED.supports_max_tokens,
	default_model = EXCLUDED.default_model,
	cost_profile = EXCLUDED.cost_profile,
	owner_team = EXCLUDED.owner_team,
	contact_email = EXCLUDED.contact_email,
	documentation_url = EXCLUDED.documentation_url,
	updated_at = EXCLUDED.updated_at
RETURNING *",
	)
	.bind(registration.service_name)
	.bind(registration.display_name)
	.bind(registration.description)
	.bind(registration.icon)
	.bind(registration.category)
	.bind(registration.service_type)
	.bind(registration.model_type)
	.bind(registration.location)
	.bind(registration.supports_temperature)
	.bind(registration.supports_max_tokens)
	.bind(registration.default_model)
	.bind(registration.cost_profile)
	.bind(registration.owner_team)
	.bind(registration.contact_email)
	.bind(registration.documentation_url)
	.bind(registration.now)
	.fetch_one(executor)
	.await?;

	Ok(row)
}

pub async fn get_entry<'e, E>(executor: E, service_name: &str) -> Result<Option<ServiceRegistryRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ServiceRegistryRow>(
		"SELECT * FROM service_registry WHERE service_name = $1 LIMIT 1",
	)
	.bind(service_name)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Active listings exclude deprecated entries; deprecated rows stay individually retrievable
/// via `get_entry`.
pub async fn list_entries<'e, E>(
	executor: E,
	active_only: bool,
	category: Option<&str>,
) -> Result<Vec<ServiceRegistryRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ServiceRegistryRow>(
		"\
SELECT * FROM service_registry
WHERE ($1::bool IS FALSE OR (is_active AND NOT is_deprecated))
	AND ($2::text IS NULL OR category = $2)
ORDER BY category, display_name",
	)
	.bind(active_only)
	.bind(category)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn deprecate<'e, E>(
	executor: E,
	service_name: &str,
	reason: &str,
	replacement_service: &str,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE service_registry
SET
	is_deprecated = TRUE,
	deprecation_reason = $2,
	replacement_service = $3,
	updated_at = $4
WHERE service_name = $1",
	)
	.bind(service_name)
	.bind(reason)
	.bind(replacement_service)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UnregisteredService {
	pub service_name: String,
	pub model_string: String,
}

/// Configurations with no registry counterpart. A health-check state, not a structural error.
pub async fn unregistered_services<'e, E>(executor: E) -> Result<Vec<UnregisteredService>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, UnregisteredService>(
		"\
SELECT mc.service_name, mc.model_string
FROM model_config mc
LEFT JOIN service_registry sr ON sr.service_name = mc.service_name
WHERE sr.service_name IS NULL
ORDER BY mc.service_name",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Registry entries with no configuration behind them.
pub async fn unconfigured_services<'e, E>(executor: E) -> Result<Vec<ServiceRegistryRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ServiceRegistryRow>(
		"\
SELECT sr.*
FROM service_registry sr
LEFT JOIN model_config mc ON mc.service_name = sr.service_name
WHERE mc.service_name IS NULL
ORDER BY sr.service_name",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DeprecatedActivity {
	pub service_name: String,
	pub replacement_service: Option<String>,
	pub last_activity: OffsetDateTime,
}

/// Deprecated services whose usage ledger shows buckets at or after `since`. These are still
/// in live use and need migration to their replacement.
pub async fn deprecated_with_usage_since<'e, E>(
	executor: E,
	since: OffsetDateTime,
) -> Result<Vec<DeprecatedActivity>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DeprecatedActivity>(
		"\
SELECT sr.service_name, sr.replacement_service, max(mu.period_start) AS last_activity
FROM service_registry sr
JOIN model_usage mu ON mu.service_name = sr.service_name
WHERE sr.is_deprecated AND mu.period_start >= $1
GROUP BY sr.service_name, sr.replacement_service
ORDER BY sr.service_name",
	)
	.bind(since)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GroupCountRow {
	pub group_key: String,
	pub count: i64,
}

pub async fn counts_by_category<'e, E>(executor: E) -> Result<Vec<GroupCountRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, GroupCountRow>(
		"\
SELECT category AS group_key, count(*) AS count
FROM service_registry
WHERE is_active AND NOT is_deprecated
GROUP BY category
ORDER BY category",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn counts_by_team<'e, E>(executor: E) -> Result<Vec<GroupCountRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, GroupCountRow>(
		"\
SELECT COALESCE(owner_team, 'unassigned') AS group_key, count(*) AS count
FROM service_registry
WHERE is_active AND NOT is_deprecated
GROUP BY COALESCE(owner_team, 'unassigned')
ORDER BY group_key",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn counts_by_cost_profile<'e, E>(executor: E) -> Result<Vec<GroupCountRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, GroupCountRow>(
		"\
SELECT cost_profile AS group_key, count(*) AS count
FROM service_registry
WHERE is_active AND NOT is_deprecated
GROUP BY cost_profile
ORDER BY cost_profile",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn count_all<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM service_registry")
		.fetch_one(executor)
		.await?;

	Ok(count)
}

pub async fn count_deprecated<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count =
		sqlx::query_scalar::<_, i64>("SELECT count(*) FROM service_registry WHERE is_deprecated")
			.fetch_one(executor)
			.await?;

	Ok(count)
}

pub async fn touch_last_used<'e, E>(
	executor: E,
	service_name: &str,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("UPDATE service_registry SET last_used = $2 WHERE service_name = $1")
		.bind(service_name)
		.bind(now)
		.execute(executor)
		.await?;

	Ok(())
}
