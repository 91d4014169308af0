use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ModelConfigRow {
	pub service_name: String,
	pub model_string: String,
	pub temperature: f32,
	pub max_tokens: Option<i32>,
	pub embedding_dimensions: Option<i32>,
	pub batch_size: Option<i32>,
	pub supports_dimensions_param: Option<bool>,
	pub optimal_batch_size: Option<i32>,
	pub cost_per_million_tokens: Option<f64>,
	pub max_input_tokens: Option<i32>,
	pub updated_at: OffsetDateTime,
	pub updated_by: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CredentialRow {
	pub provider: String,
	pub encrypted_secret: String,
	pub base_url: Option<String>,
	pub headers: Option<Value>,
	pub is_active: bool,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ServiceRegistryRow {
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
	pub is_active: bool,
	pub is_deprecated: bool,
	pub deprecation_reason: Option<String>,
	pub replacement_service: Option<String>,
	pub owner_team: Option<String>,
	pub contact_email: Option<String>,
	pub documentation_url: Option<String>,
	pub first_seen: Option<OffsetDateTime>,
	pub last_used: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AvailableModelRow {
	pub provider: String,
	pub model_id: String,
	pub model_string: String,
	pub display_name: String,
	pub description: Option<String>,
	pub context_length: Option<i32>,
	pub input_cost: Option<f64>,
	pub output_cost: Option<f64>,
	pub supports_vision: bool,
	pub supports_tools: bool,
	pub supports_reasoning: bool,
	pub is_embedding: bool,
	pub is_free: bool,
	pub cost_tier: String,
	pub is_active: bool,
	pub source: String,
	pub last_updated: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UsageRow {
	pub service_name: String,
	pub model_string: String,
	pub period_start: OffsetDateTime,
	pub period_end: OffsetDateTime,
	pub request_count: i64,
	pub total_tokens: i64,
	pub estimated_cost: f64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DailyCostRow {
	pub period_start: OffsetDateTime,
	pub request_count: i64,
	pub total_tokens: i64,
	pub estimated_cost: f64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UsageGroupRow {
	pub group_key: String,
	pub request_count: i64,
	pub total_tokens: i64,
	pub estimated_cost: f64,
}

/// One hit from the unioned cross-dimension view. The vector itself travels as its Postgres
/// text rendering; `chunk_vector` parses it.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ChunkEmbeddingRow {
	pub id: Uuid,
	pub source_id: String,
	pub url: String,
	pub chunk_number: i32,
	pub content: String,
	pub metadata: Value,
	pub embedding_model: String,
	pub embedding_dim: i32,
	pub embedding: String,
	pub created_at: OffsetDateTime,
}
