use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Staleness sweep, as a predicate over a single catalog row.
///
/// A row is swept when it belongs to the source being synced and its `last_updated` precedes the
/// start of the pass, i.e. the pass never touched it. Rows from other sources (manual and local
/// entries included) are exempt no matter how old they are.
pub fn is_stale(
	row_source: &str,
	row_last_updated: OffsetDateTime,
	sweep_source: &str,
	sync_started_at: OffsetDateTime,
) -> bool {
	row_source == sweep_source && row_last_updated < sync_started_at
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
	Free,
	Low,
	Medium,
	High,
}
impl CostTier {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Free => "free",
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}
}

/// Buckets a model by its per-million input price: free when nothing is charged, then low
/// under $0.50, medium under $5, high above.
pub fn cost_tier(input_cost: f64, output_cost: f64) -> CostTier {
	if input_cost <= 0.0 && output_cost <= 0.0 {
		CostTier::Free
	} else if input_cost < 0.5 {
		CostTier::Low
	} else if input_cost < 5.0 {
		CostTier::Medium
	} else {
		CostTier::High
	}
}
