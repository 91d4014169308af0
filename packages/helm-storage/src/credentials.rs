use serde_json::Value;
use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::CredentialRow};

/// Upsert keyed by provider: at most one row ever exists per provider, and re-setting a key
/// reactivates a previously deactivated row.
pub async fn upsert_credential<'e, E>(
	executor: E,
	provider: &str,
	encrypted_secret: &str,
	base_url: Option<&str>,
	headers: Option<&Value>,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO provider_credentials (provider, encrypted_secret, base_url, headers, is_active, updated_at)
VALUES ($1, $2, $3, $4, TRUE, $5)
ON CONFLICT (provider) DO UPDATE
SET
	encrypted_secret = EXCLUDED.encrypted_secret,
	base_url = EXCLUDED.base_url,
	headers = EXCLUDED.headers,
	is_active = TRUE,
	updated_at = EXCLUDED.updated_at",
	)
	.bind(provider)
	.bind(encrypted_secret)
	.bind(base_url)
	.bind(headers)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_credential<'e, E>(executor: E, provider: &str) -> Result<Option<CredentialRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, CredentialRow>(
		"SELECT * FROM provider_credentials WHERE provider = $1 LIMIT 1",
	)
	.bind(provider)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Deactivation flips the flag and nothing else. The ciphertext stays for audit history.
pub async fn deactivate_credential<'e, E>(
	executor: E,
	provider: &str,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"UPDATE provider_credentials SET is_active = FALSE, updated_at = $2 WHERE provider = $1",
	)
	.bind(provider)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn rotate_secret<'e, E>(
	executor: E,
	provider: &str,
	encrypted_secret: &str,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE provider_credentials
SET encrypted_secret = $2, is_active = TRUE, updated_at = $3
WHERE provider = $1",
	)
	.bind(provider)
	.bind(encrypted_secret)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn list_active_providers<'e, E>(executor: E) -> Result<Vec<String>>
where
	E: PgExecutor<'e>,
{
	let providers = sqlx::query_scalar::<_, String>(
		"SELECT provider FROM provider_credentials WHERE is_active ORDER BY provider",
	)
	.fetch_all(executor)
	.await?;

	Ok(providers)
}
