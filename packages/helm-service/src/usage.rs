use time::{Duration, OffsetDateTime};

use helm_domain::{model_string::ModelString, usage::day_bucket};
use helm_storage::{
	models::{DailyCostRow, UsageGroupRow},
	usage,
};

use crate::{Error, HelmService, Result, retry};

const DAYS_PER_MONTH: f64 = 30.0;

#[derive(Clone, Debug)]
pub struct RecordUsageRequest {
	pub service_name: String,
	pub model_string: String,
	pub tokens: i64,
	pub cost: f64,
	/// Defaults to now. The ledger buckets by the UTC day of this timestamp.
	pub at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug)]
pub struct UsageSummary {
	pub request_count: i64,
	pub total_tokens: i64,
	pub estimated_cost: f64,
	pub avg_tokens_per_request: f64,
	pub by_model: Vec<UsageGroupRow>,
	/// Populated only for the unfiltered summary.
	pub by_service: Vec<UsageGroupRow>,
}

impl HelmService {
	/// Adds one request to the (service, model, UTC day) bucket. The increment is one
	/// server-side statement, so concurrent recorders targeting the same bucket all land;
	/// being idempotent per statement it is retried on transient connectivity failure.
	pub async fn record_usage(&self, req: &RecordUsageRequest) -> Result<()> {
		let service_name = req.service_name.trim();

		if service_name.is_empty() {
			return Err(Error::Validation { message: "service_name is required.".to_string() });
		}

		ModelString::parse(&req.model_string)?;

		if req.tokens < 0 {
			return Err(Error::Validation {
				message: "tokens must be non-negative.".to_string(),
			});
		}
		if req.cost < 0.0 {
			return Err(Error::Validation { message: "cost must be non-negative.".to_string() });
		}

		let at = req.at.unwrap_or_else(OffsetDateTime::now_utc);
		let (period_start, period_end) = day_bucket(at);
		let mut attempt = 0;

		loop {
			let written = usage::increment_usage(
				&self.db.pool,
				service_name,
				&req.model_string,
				period_start,
				period_end,
				req.tokens,
				req.cost,
			)
			.await;

			match written {
				Ok(()) => break,
				Err(err) if retry::is_transient(&err) && attempt + 1 < retry::MAX_ATTEMPTS => {
					attempt += 1;

					tracing::warn!(
						service_name,
						attempt,
						error = %err,
						"Transient failure recording usage; retrying.",
					);
					tokio::time::sleep(retry::backoff(attempt)).await;
				},
				Err(err) => return Err(err.into()),
			}
		}

		self.note_service_used(service_name).await;

		Ok(())
	}

	/// Per-day aggregates across all services from `start_date` onward, newest first.
	pub async fn daily_costs(&self, start_date: OffsetDateTime) -> Result<Vec<DailyCostRow>> {
		Ok(usage::daily_costs(&self.db.pool, start_date).await?)
	}

	pub async fn usage_summary(&self, service_name: Option<&str>) -> Result<UsageSummary> {
		let totals = usage::totals(&self.db.pool, service_name).await?;
		let by_model = usage::totals_by_model(&self.db.pool, service_name).await?;
		let by_service = match service_name {
			None => usage::totals_by_service(&self.db.pool).await?,
			Some(_) => Vec::new(),
		};
		let avg_tokens_per_request = if totals.request_count > 0 {
			totals.total_tokens as f64 / totals.request_count as f64
		} else {
			0.0
		};

		Ok(UsageSummary {
			request_count: totals.request_count,
			total_tokens: totals.total_tokens,
			estimated_cost: totals.estimated_cost,
			avg_tokens_per_request,
			by_model,
			by_service,
		})
	}

	/// Projects a monthly spend from the trailing `based_on_days` of ledger data.
	pub async fn estimate_monthly_cost(&self, based_on_days: u32) -> Result<f64> {
		if based_on_days == 0 {
			return Err(Error::Validation {
				message: "based_on_days must be greater than zero.".to_string(),
			});
		}

		let since = OffsetDateTime::now_utc() - Duration::days(i64::from(based_on_days));
		let observed = usage::cost_since(&self.db.pool, since).await?;

		Ok(observed / f64::from(based_on_days) * DAYS_PER_MONTH)
	}
}
