use time::OffsetDateTime;

use helm_domain::{classify, model_string::ModelString};
use helm_storage::{
	credentials,
	model_config::{self, ModelConfigUpsert},
	models::ModelConfigRow,
	registry::{self, DerivedEntry},
};

use crate::{Error, HelmService, Result};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DERIVED_OWNER_TEAM: &str = "auto-discovered";

#[derive(Clone, Debug)]
pub struct UpsertConfigRequest {
	pub service_name: String,
	pub model_string: String,
	pub temperature: Option<f32>,
	pub max_tokens: Option<i32>,
	pub embedding_dimensions: Option<u32>,
	pub batch_size: Option<i32>,
	pub supports_dimensions_param: Option<bool>,
	pub optimal_batch_size: Option<i32>,
	pub cost_per_million_tokens: Option<f64>,
	pub max_input_tokens: Option<i32>,
	pub updated_by: Option<String>,
}

#[derive(Clone, Debug)]
pub struct StoredModelConfig {
	pub config: ModelConfigRow,
	pub provider_name: String,
	pub model_id: String,
}

impl HelmService {
	/// Stores one service's model configuration and refreshes its registry entry in the same
	/// transaction, so a configured service is never observable without a registry row.
	pub async fn upsert_config(&self, req: UpsertConfigRequest) -> Result<StoredModelConfig> {
		let service_name = req.service_name.trim();

		if service_name.is_empty() {
			return Err(Error::Validation { message: "service_name is required.".to_string() });
		}

		let model = ModelString::parse(req.model_string.trim())?;
		let class = classify::classify(service_name, &req.model_string);

		if class.is_embedding() {
			let Some(dimensions) = req.embedding_dimensions else {
				return Err(Error::Validation {
					message: format!(
						"embedding_dimensions is required for embedding service {service_name:?}."
					),
				});
			};

			// Reject before any write; an unprovisioned width would otherwise produce a
			// config no vector store can serve.
			self.dimensions.resolve(dimensions)?;
		}

		let now = OffsetDateTime::now_utc();
		let model_string = model.to_string();
		let upsert = ModelConfigUpsert {
			service_name,
			model_string: &model_string,
			temperature: req.temperature.unwrap_or(DEFAULT_TEMPERATURE),
			max_tokens: req.max_tokens,
			embedding_dimensions: req.embedding_dimensions.map(|dims| dims as i32),
			batch_size: req.batch_size,
			supports_dimensions_param: req.supports_dimensions_param,
			optimal_batch_size: req.optimal_batch_size,
			cost_per_million_tokens: req.cost_per_million_tokens,
			max_input_tokens: req.max_input_tokens,
			updated_by: req.updated_by.as_deref().unwrap_or("system"),
			updated_at: now,
		};
		let display_name = classify::display_name(service_name);
		let description = format!("Auto-discovered service using {model_string}");
		let derived = DerivedEntry {
			service_name,
			display_name: &display_name,
			description: &description,
			icon: class.icon(),
			category: class.category(),
			service_type: class.service_type(),
			model_type: class.model_type(),
			location: class.location(),
			supports_temperature: class.supports_temperature(),
			supports_max_tokens: class.supports_max_tokens(),
			default_model: &model_string,
			owner_team: DERIVED_OWNER_TEAM,
			now,
		};
		let mut tx = self.db.pool.begin().await?;
		let config = model_config::upsert_config(&mut *tx, &upsert).await?;

		registry::upsert_derived(&mut *tx, &derived).await?;
		tx.commit().await?;

		if credentials::get_credential(&self.db.pool, &model.provider).await?.is_none() {
			tracing::warn!(
				service_name,
				provider = %model.provider,
				"Configured service references a provider with no stored credential.",
			);
		}

		tracing::info!(service_name, model_string = %model_string, "Stored model configuration.");

		Ok(StoredModelConfig {
			config,
			provider_name: model.provider,
			model_id: model.model_id,
		})
	}

	pub async fn get_config(&self, service_name: &str) -> Result<StoredModelConfig> {
		let config = model_config::get_config(&self.db.pool, service_name)
			.await?
			.ok_or_else(|| Error::NotFound {
				message: format!("No model configuration for service {service_name:?}."),
			})?;
		let model = ModelString::parse(&config.model_string)?;

		Ok(StoredModelConfig { config, provider_name: model.provider, model_id: model.model_id })
	}

	pub async fn list_configs(&self) -> Result<Vec<ModelConfigRow>> {
		Ok(model_config::list_configs(&self.db.pool).await?)
	}

	/// Removes the configuration row only. The registry entry survives and shows up as
	/// unconfigured in registry validation until re-configured or retired.
	pub async fn delete_config(&self, service_name: &str) -> Result<()> {
		if !model_config::delete_config(&self.db.pool, service_name).await? {
			return Err(Error::NotFound {
				message: format!("No model configuration for service {service_name:?}."),
			});
		}

		tracing::info!(service_name, "Deleted model configuration.");

		Ok(())
	}
}
