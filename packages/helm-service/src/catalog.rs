use std::{collections::HashSet, sync::Mutex, time::Duration};

use serde::Deserialize;
use time::OffsetDateTime;

use helm_domain::catalog::cost_tier;
use helm_storage::{
	catalog::{self, ModelFilters, ModelSync},
	models::AvailableModelRow,
};

use crate::{Error, HelmService, Result, retry};

/// Per-token upstream prices become per-million for storage and tiering.
const PER_MILLION: f64 = 1_000_000.0;

/// One pass per source at a time. The set holds sources with a pass in flight; a second
/// entry is refused with `Conflict` and the caller retries after the current pass ends.
#[derive(Default)]
pub(crate) struct SyncGuard {
	inflight: Mutex<HashSet<String>>,
}
impl SyncGuard {
	fn acquire<'a>(&'a self, source: &str) -> Result<SyncPermit<'a>> {
		let mut inflight = self.inflight.lock().map_err(|_| Error::Conflict {
			message: "Sync guard is poisoned.".to_string(),
		})?;

		if !inflight.insert(source.to_string()) {
			return Err(Error::Conflict {
				message: format!("A sync pass for source {source:?} is already running."),
			});
		}

		Ok(SyncPermit { guard: self, source: source.to_string() })
	}

	fn release(&self, source: &str) {
		if let Ok(mut inflight) = self.inflight.lock() {
			inflight.remove(source);
		}
	}
}

struct SyncPermit<'a> {
	guard: &'a SyncGuard,
	source: String,
}
impl Drop for SyncPermit<'_> {
	fn drop(&mut self) {
		self.guard.release(&self.source);
	}
}

#[derive(Clone, Debug)]
pub struct SyncModelRequest {
	pub provider: String,
	pub model_id: String,
	pub display_name: Option<String>,
	pub description: Option<String>,
	pub context_length: Option<i32>,
	pub input_cost: Option<f64>,
	pub output_cost: Option<f64>,
	pub supports_vision: bool,
	pub supports_tools: bool,
	pub supports_reasoning: bool,
	pub is_embedding: bool,
	pub source: String,
}

#[derive(Clone, Debug)]
pub struct SyncReport {
	pub source: String,
	pub models_synced: u64,
	pub models_deactivated: u64,
	pub duration: Duration,
}

/// One model as parsed from the external catalog payload.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogModel {
	pub provider: String,
	pub model_id: String,
	pub display_name: String,
	pub description: Option<String>,
	pub context_length: Option<i32>,
	pub input_cost: Option<f64>,
	pub output_cost: Option<f64>,
	pub supports_vision: bool,
	pub supports_tools: bool,
	pub supports_reasoning: bool,
	pub is_embedding: bool,
}

#[derive(Debug, Deserialize)]
struct RemoteCatalog {
	data: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
	id: String,
	name: Option<String>,
	description: Option<String>,
	context_length: Option<i64>,
	pricing: Option<RemotePricing>,
	architecture: Option<RemoteArchitecture>,
	supported_parameters: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RemotePricing {
	prompt: Option<String>,
	completion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteArchitecture {
	input_modalities: Option<Vec<String>>,
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
	raw?.trim().parse::<f64>().ok().map(|per_token| per_token * PER_MILLION)
}

/// Converts the external payload into catalog models. Ids are `"provider/model_id"`; an id
/// with no slash belongs to the catalog source itself.
fn parse_catalog(payload: &RemoteCatalog, fallback_provider: &str) -> Vec<CatalogModel> {
	payload
		.data
		.iter()
		.map(|remote| {
			let (provider, model_id) = match remote.id.split_once('/') {
				Some((provider, model_id)) => (provider.to_string(), model_id.to_string()),
				None => (fallback_provider.to_string(), remote.id.clone()),
			};
			let parameters = remote.supported_parameters.as_deref().unwrap_or(&[]);
			let modalities = remote
				.architecture
				.as_ref()
				.and_then(|architecture| architecture.input_modalities.as_deref())
				.unwrap_or(&[]);

			CatalogModel {
				display_name: remote.name.clone().unwrap_or_else(|| model_id.clone()),
				description: remote.description.clone(),
				context_length: remote.context_length.map(|length| length as i32),
				input_cost: parse_price(
					remote.pricing.as_ref().and_then(|pricing| pricing.prompt.as_deref()),
				),
				output_cost: parse_price(
					remote.pricing.as_ref().and_then(|pricing| pricing.completion.as_deref()),
				),
				supports_vision: modalities.iter().any(|modality| modality == "image"),
				supports_tools: parameters.iter().any(|parameter| parameter == "tools"),
				supports_reasoning: parameters
					.iter()
					.any(|parameter| parameter == "reasoning" || parameter == "include_reasoning"),
				is_embedding: remote.id.contains("embedding"),
				provider,
				model_id,
			}
		})
		.collect()
}

/// Models seeded for a default local runtime that exposes no catalog endpoint.
const LOCAL_MODELS: &[(&str, &str, bool)] = &[
	("ollama", "llama3.1:8b", false),
	("ollama", "qwen2.5:7b", false),
	("ollama", "nomic-embed-text", true),
	("ollama", "mxbai-embed-large", true),
];

impl HelmService {
	/// Idempotent catalog upsert keyed by (provider, model_id). Always stamps `last_updated`
	/// and reactivates the row, so a model that reappears upstream recovers from an earlier
	/// staleness sweep without intervention. Retried on transient storage failure.
	pub async fn sync_model(&self, req: &SyncModelRequest) -> Result<AvailableModelRow> {
		let provider = req.provider.trim();
		let model_id = req.model_id.trim();

		if provider.is_empty() || model_id.is_empty() {
			return Err(Error::Validation {
				message: "provider and model_id are required.".to_string(),
			});
		}
		if provider.contains(':') || model_id.contains(':') {
			return Err(Error::Validation {
				message: "provider and model_id must not contain ':'.".to_string(),
			});
		}
		if req.source.trim().is_empty() {
			return Err(Error::Validation { message: "source is required.".to_string() });
		}

		let input_cost = req.input_cost.unwrap_or(0.0);
		let output_cost = req.output_cost.unwrap_or(0.0);
		let tier = cost_tier(input_cost, output_cost);
		let display_name = req.display_name.as_deref().unwrap_or(model_id);
		let model = ModelSync {
			provider,
			model_id,
			display_name,
			description: req.description.as_deref(),
			context_length: req.context_length,
			input_cost: req.input_cost,
			output_cost: req.output_cost,
			supports_vision: req.supports_vision,
			supports_tools: req.supports_tools,
			supports_reasoning: req.supports_reasoning,
			is_embedding: req.is_embedding,
			is_free: tier == helm_domain::catalog::CostTier::Free,
			cost_tier: tier.as_str(),
			source: req.source.trim(),
			now: OffsetDateTime::now_utc(),
		};
		let mut attempt = 0;

		loop {
			match catalog::sync_model(&self.db.pool, &model).await {
				Ok(row) => return Ok(row),
				Err(err) if retry::is_transient(&err) && attempt + 1 < retry::MAX_ATTEMPTS => {
					attempt += 1;

					tracing::warn!(
						provider,
						model_id,
						attempt,
						error = %err,
						"Transient failure syncing model; retrying.",
					);
					tokio::time::sleep(retry::backoff(attempt)).await;
				},
				Err(err) => return Err(err.into()),
			}
		}
	}

	/// Ends a sync pass: deactivates exactly the rows of `source` the pass never touched.
	/// Rows from every other source are exempt regardless of age.
	pub async fn complete_sync(
		&self,
		source: &str,
		sync_started_at: OffsetDateTime,
	) -> Result<u64> {
		let swept = catalog::deactivate_stale(&self.db.pool, source, sync_started_at).await?;

		if swept > 0 {
			tracing::info!(source, swept, "Deactivated stale catalog rows.");
		}

		Ok(swept)
	}

	pub async fn list_models(&self, filters: &ModelFilters) -> Result<Vec<AvailableModelRow>> {
		Ok(catalog::list_models(&self.db.pool, filters).await?)
	}

	pub async fn get_model(&self, provider: &str, model_id: &str) -> Result<AvailableModelRow> {
		catalog::get_model(&self.db.pool, provider, model_id).await?.ok_or_else(|| {
			Error::NotFound { message: format!("No catalog entry for {provider}:{model_id}.") }
		})
	}

	/// One full pass against the external catalog: fetch, upsert every model, then sweep the
	/// source's untouched rows. Single-flight per source.
	pub async fn run_sync_pass(&self, source: &str) -> Result<SyncReport> {
		let _permit = self.syncing.acquire(source)?;
		let started_at = OffsetDateTime::now_utc();
		let clock = std::time::Instant::now();
		let url = format!(
			"{}{}",
			self.cfg.catalog.api_base.trim_end_matches('/'),
			self.cfg.catalog.path,
		);
		let timeout = Duration::from_millis(self.cfg.catalog.timeout_ms);
		let payload: RemoteCatalog =
			self.http.get(&url).timeout(timeout).send().await?.error_for_status()?.json().await?;
		let models = parse_catalog(&payload, source);
		let mut models_synced = 0;

		for model in &models {
			let req = SyncModelRequest {
				provider: model.provider.clone(),
				model_id: model.model_id.clone(),
				display_name: Some(model.display_name.clone()),
				description: model.description.clone(),
				context_length: model.context_length,
				input_cost: model.input_cost,
				output_cost: model.output_cost,
				supports_vision: model.supports_vision,
				supports_tools: model.supports_tools,
				supports_reasoning: model.supports_reasoning,
				is_embedding: model.is_embedding,
				source: source.to_string(),
			};

			self.sync_model(&req).await?;

			models_synced += 1;
		}

		let models_deactivated = self.complete_sync(source, started_at).await?;
		let report = SyncReport {
			source: source.to_string(),
			models_synced,
			models_deactivated,
			duration: clock.elapsed(),
		};

		tracing::info!(
			source,
			models_synced = report.models_synced,
			models_deactivated = report.models_deactivated,
			"Catalog sync pass finished.",
		);

		Ok(report)
	}

	/// Seeds catalog rows for local runtime models that no external catalog describes.
	pub async fn seed_local_models(&self) -> Result<u64> {
		let _permit = self.syncing.acquire("local")?;
		let started_at = OffsetDateTime::now_utc();

		for (provider, model_id, is_embedding) in LOCAL_MODELS {
			let req = SyncModelRequest {
				provider: (*provider).to_string(),
				model_id: (*model_id).to_string(),
				display_name: None,
				description: None,
				context_length: None,
				input_cost: None,
				output_cost: None,
				supports_vision: false,
				supports_tools: false,
				supports_reasoning: false,
				is_embedding: *is_embedding,
				source: "local".to_string(),
			};

			self.sync_model(&req).await?;
		}

		self.complete_sync("local", started_at).await
	}
}
