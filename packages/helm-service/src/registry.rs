use time::{Duration, OffsetDateTime};

use helm_storage::{
	models::ServiceRegistryRow,
	registry::{self, Registration, UnregisteredService},
};

use crate::{Error, HelmService, Result};

/// How far back the validation report looks for traffic on deprecated services.
const DEPRECATED_USAGE_WINDOW_DAYS: i64 = 7;

#[derive(Clone, Debug)]
pub struct RegisterServiceRequest {
	pub service_name: String,
	pub display_name: String,
	pub description: Option<String>,
	pub icon: Option<String>,
	pub category: String,
	pub service_type: String,
	pub model_type: String,
	pub location: Option<String>,
	pub supports_temperature: bool,
	pub supports_max_tokens: bool,
	pub default_model: Option<String>,
	pub cost_profile: String,
	pub owner_team: Option<String>,
	pub contact_email: Option<String>,
	pub documentation_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct DeprecatedUsage {
	pub service_name: String,
	pub replacement_service: Option<String>,
	pub last_activity: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct RegistryValidation {
	pub unregistered: Vec<UnregisteredService>,
	pub unconfigured: Vec<ServiceRegistryRow>,
	pub deprecated_in_use: Vec<DeprecatedUsage>,
}
impl RegistryValidation {
	pub fn is_healthy(&self) -> bool {
		self.unregistered.is_empty()
			&& self.unconfigured.is_empty()
			&& self.deprecated_in_use.is_empty()
	}
}

#[derive(Clone, Debug)]
pub struct RegistryStatistics {
	pub total: i64,
	pub deprecated: i64,
	pub by_category: Vec<(String, i64)>,
	pub by_team: Vec<(String, i64)>,
	pub by_cost_profile: Vec<(String, i64)>,
}

impl HelmService {
	/// Direct operator registration. Unlike derivation from a configuration write, this
	/// replaces the display fields of an existing row.
	pub async fn register_service(
		&self,
		req: RegisterServiceRequest,
	) -> Result<ServiceRegistryRow> {
		let service_name = req.service_name.trim();

		if service_name.is_empty() || req.display_name.trim().is_empty() {
			return Err(Error::Validation {
				message: "service_name and display_name are required.".to_string(),
			});
		}
		if req.category.trim().is_empty() || req.service_type.trim().is_empty() {
			return Err(Error::Validation {
				message: "category and service_type are required.".to_string(),
			});
		}

		let registration = Registration {
			service_name,
			display_name: req.display_name.trim(),
			description: req.description.as_deref(),
			icon: req.icon.as_deref(),
			category: &req.category,
			service_type: &req.service_type,
			model_type: &req.model_type,
			location: req.location.as_deref(),
			supports_temperature: req.supports_temperature,
			supports_max_tokens: req.supports_max_tokens,
			default_model: req.default_model.as_deref(),
			cost_profile: &req.cost_profile,
			owner_team: req.owner_team.as_deref(),
			contact_email: req.contact_email.as_deref(),
			documentation_url: req.documentation_url.as_deref(),
			now: OffsetDateTime::now_utc(),
		};
		let row = registry::register(&self.db.pool, &registration).await?;

		tracing::info!(service_name, "Registered service.");

		Ok(row)
	}

	pub async fn get_service(&self, service_name: &str) -> Result<ServiceRegistryRow> {
		registry::get_entry(&self.db.pool, service_name).await?.ok_or_else(|| Error::NotFound {
			message: format!("No registry entry for service {service_name:?}."),
		})
	}

	pub async fn list_services(
		&self,
		active_only: bool,
		category: Option<&str>,
	) -> Result<Vec<ServiceRegistryRow>> {
		Ok(registry::list_entries(&self.db.pool, active_only, category).await?)
	}

	/// Deprecation requires a replacement so callers are never pointed at a dead end. The row
	/// drops out of active listings but stays retrievable by name.
	pub async fn deprecate_service(
		&self,
		service_name: &str,
		reason: &str,
		replacement_service: &str,
	) -> Result<()> {
		if replacement_service.trim().is_empty() {
			return Err(Error::Validation {
				message: "A replacement service is required to deprecate.".to_string(),
			});
		}
		if reason.trim().is_empty() {
			return Err(Error::Validation {
				message: "A deprecation reason is required.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();

		if !registry::deprecate(&self.db.pool, service_name, reason, replacement_service, now)
			.await?
		{
			return Err(Error::NotFound {
				message: format!("No registry entry for service {service_name:?}."),
			});
		}

		tracing::info!(service_name, replacement_service, "Deprecated service.");

		Ok(())
	}

	/// Cross-checks configuration, registry, and the usage ledger. Findings are health-check
	/// states, not errors; the report is always produced.
	pub async fn validate_registry(&self) -> Result<RegistryValidation> {
		let unregistered = registry::unregistered_services(&self.db.pool).await?;
		let unconfigured = registry::unconfigured_services(&self.db.pool).await?;
		let since = OffsetDateTime::now_utc() - Duration::days(DEPRECATED_USAGE_WINDOW_DAYS);
		let deprecated_in_use = registry::deprecated_with_usage_since(&self.db.pool, since)
			.await?
			.into_iter()
			.map(|activity| DeprecatedUsage {
				service_name: activity.service_name,
				replacement_service: activity.replacement_service,
				last_activity: activity.last_activity,
			})
			.collect();

		Ok(RegistryValidation { unregistered, unconfigured, deprecated_in_use })
	}

	pub async fn registry_statistics(&self) -> Result<RegistryStatistics> {
		let total = registry::count_all(&self.db.pool).await?;
		let deprecated = registry::count_deprecated(&self.db.pool).await?;
		let by_category = registry::counts_by_category(&self.db.pool).await?;
		let by_team = registry::counts_by_team(&self.db.pool).await?;
		let by_cost_profile = registry::counts_by_cost_profile(&self.db.pool).await?;

		fn flatten(rows: Vec<registry::GroupCountRow>) -> Vec<(String, i64)> {
			rows.into_iter().map(|row| (row.group_key, row.count)).collect()
		}

		Ok(RegistryStatistics {
			total,
			deprecated,
			by_category: flatten(by_category),
			by_team: flatten(by_team),
			by_cost_profile: flatten(by_cost_profile),
		})
	}

	/// Best effort: a missed `last_used` stamp must never fail the caller's request.
	pub async fn note_service_used(&self, service_name: &str) {
		let now = OffsetDateTime::now_utc();

		if let Err(err) = registry::touch_last_used(&self.db.pool, service_name, now).await {
			tracing::warn!(service_name, error = %err, "Failed to stamp last_used.");
		}
	}
}
