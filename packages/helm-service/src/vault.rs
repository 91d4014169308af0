use std::{
	collections::HashMap,
	sync::Mutex,
	time::{Duration, Instant},
};

use serde_json::Value;
use time::OffsetDateTime;

use helm_storage::credentials;

use crate::{Error, HelmService, Result};

/// Outcome of a connectivity probe. Probe failures are statuses, never errors; only a broken
/// ciphertext surfaces as an `Err`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyStatus {
	/// Credential present and the provider answered the probe.
	Active,
	/// Credential present but the provider rejected it or answered badly.
	Degraded,
	/// Credential present but the provider was unreachable.
	Error,
	/// No active credential stored for this provider.
	Unconfigured,
}

/// Decrypted secrets between storage reads. Entries expire after the configured TTL and are
/// purged on every write to their provider, so a rotation or deactivation takes effect at
/// once in-process.
pub(crate) struct SecretCache {
	ttl: Duration,
	entries: Mutex<HashMap<String, (String, Instant)>>,
}
impl SecretCache {
	pub(crate) fn new(ttl: Duration) -> Self {
		Self { ttl, entries: Mutex::new(HashMap::new()) }
	}

	fn get(&self, provider: &str) -> Option<String> {
		let mut entries = self.entries.lock().ok()?;

		match entries.get(provider) {
			Some((secret, stored_at)) if stored_at.elapsed() < self.ttl => Some(secret.clone()),
			Some(_) => {
				entries.remove(provider);

				None
			},
			None => None,
		}
	}

	fn put(&self, provider: &str, secret: &str) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.insert(provider.to_string(), (secret.to_string(), Instant::now()));
		}
	}

	fn purge(&self, provider: &str) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.remove(provider);
		}
	}
}

/// Well-known provider endpoints, applied when a credential is stored without an explicit
/// base url.
fn default_base_url(provider: &str) -> Option<&'static str> {
	match provider {
		"openai" => Some("https://api.openai.com/v1"),
		"anthropic" => Some("https://api.anthropic.com/v1"),
		"google" => Some("https://generativelanguage.googleapis.com/v1beta"),
		"openrouter" => Some("https://openrouter.ai/api/v1"),
		"ollama" => Some("http://localhost:11434/v1"),
		_ => None,
	}
}

impl HelmService {
	/// Stores (or replaces) a provider credential. The plaintext is encrypted before it
	/// reaches storage and never logged; re-setting a deactivated provider reactivates it.
	pub async fn set_key(
		&self,
		provider: &str,
		secret: &str,
		base_url: Option<&str>,
		headers: Option<&Value>,
	) -> Result<()> {
		let provider = provider.trim();

		if provider.is_empty() {
			return Err(Error::Validation { message: "provider is required.".to_string() });
		}
		if secret.is_empty() {
			return Err(Error::Validation { message: "secret must be non-empty.".to_string() });
		}

		let encrypted = self.cipher.encrypt(secret)?;
		let base_url = base_url.or_else(|| default_base_url(provider));
		let now = OffsetDateTime::now_utc();

		credentials::upsert_credential(&self.db.pool, provider, &encrypted, base_url, headers, now)
			.await?;
		self.secrets.purge(provider);

		tracing::info!(provider, "Stored provider credential.");

		Ok(())
	}

	/// Returns the decrypted secret for an active provider, serving from the TTL cache when
	/// fresh. An inactive or missing row is `NotConfigured`; an undecryptable row is
	/// `Decryption` and means the stored blob or the master key is wrong.
	pub async fn get_key(&self, provider: &str) -> Result<String> {
		if let Some(secret) = self.secrets.get(provider) {
			return Ok(secret);
		}

		let row = self.active_credential(provider).await?;
		let secret = self.cipher.decrypt(&row.encrypted_secret)?;

		self.secrets.put(provider, &secret);

		Ok(secret)
	}

	/// Flag flip only. The ciphertext stays for audit history and a later `set_key` brings
	/// the provider back.
	pub async fn deactivate_key(&self, provider: &str) -> Result<()> {
		let now = OffsetDateTime::now_utc();

		if !credentials::deactivate_credential(&self.db.pool, provider, now).await? {
			return Err(Error::NotFound {
				message: format!("No credential stored for provider {provider:?}."),
			});
		}

		self.secrets.purge(provider);

		tracing::info!(provider, "Deactivated provider credential.");

		Ok(())
	}

	/// Replaces the secret of an existing provider. Operator-driven and never auto-retried;
	/// a failure surfaces so the operator knows which key is live.
	pub async fn rotate_key(&self, provider: &str, new_secret: &str) -> Result<()> {
		if new_secret.is_empty() {
			return Err(Error::Validation { message: "secret must be non-empty.".to_string() });
		}

		let encrypted = self.cipher.encrypt(new_secret)?;
		let now = OffsetDateTime::now_utc();

		if !credentials::rotate_secret(&self.db.pool, provider, &encrypted, now).await? {
			return Err(Error::NotFound {
				message: format!("No credential stored for provider {provider:?}."),
			});
		}

		self.secrets.purge(provider);

		tracing::info!(provider, "Rotated provider credential.");

		Ok(())
	}

	/// Probes the provider endpoint with the stored credential.
	pub async fn test_key(&self, provider: &str) -> Result<KeyStatus> {
		let row = match self.active_credential(provider).await {
			Ok(row) => row,
			Err(Error::NotConfigured { .. }) => return Ok(KeyStatus::Unconfigured),
			Err(err) => return Err(err),
		};
		let secret = self.cipher.decrypt(&row.encrypted_secret)?;
		let Some(base_url) = row.base_url.or_else(|| default_base_url(provider).map(String::from))
		else {
			// Nothing to probe against. The key decrypts, which is all we can verify.
			return Ok(KeyStatus::Active);
		};
		let url = format!("{}/models", base_url.trim_end_matches('/'));
		let timeout = Duration::from_millis(self.cfg.vault.probe_timeout_ms);
		let response =
			self.http.get(&url).bearer_auth(&secret).timeout(timeout).send().await;

		match response {
			Ok(reply) if reply.status().is_success() => Ok(KeyStatus::Active),
			Ok(reply) => {
				tracing::warn!(provider, status = %reply.status(), "Credential probe rejected.");

				Ok(KeyStatus::Degraded)
			},
			Err(err) => {
				tracing::warn!(provider, error = %err, "Credential probe unreachable.");

				Ok(KeyStatus::Error)
			},
		}
	}

	pub async fn list_key_providers(&self) -> Result<Vec<String>> {
		Ok(credentials::list_active_providers(&self.db.pool).await?)
	}

	async fn active_credential(
		&self,
		provider: &str,
	) -> Result<helm_storage::models::CredentialRow> {
		let row = credentials::get_credential(&self.db.pool, provider).await?;

		match row {
			Some(row) if row.is_active => Ok(row),
			_ => Err(Error::NotConfigured {
				message: format!("No active credential for provider {provider:?}."),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cache_expires_entries() {
		let cache = SecretCache::new(Duration::from_millis(0));

		cache.put("openai", "sk-test");
		assert_eq!(cache.get("openai"), None);
	}

	#[test]
	fn cache_serves_fresh_entries_and_purges() {
		let cache = SecretCache::new(Duration::from_secs(60));

		cache.put("openai", "sk-test");
		assert_eq!(cache.get("openai").as_deref(), Some("sk-test"));

		cache.purge("openai");
		assert_eq!(cache.get("openai"), None);
	}

	#[test]
	fn known_providers_have_default_endpoints() {
		assert!(default_base_url("openai").is_some());
		assert!(default_base_url("anthropic").is_some());
		assert_eq!(default_base_url("acme"), None);
	}
}
