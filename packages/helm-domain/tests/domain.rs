use time::macros::datetime;

use helm_domain::{
	Error,
	catalog::{self, CostTier},
	classify::{self, ServiceClass},
	model_string::ModelString,
	usage,
};

#[test]
fn parses_valid_model_strings() {
	let parsed = ModelString::parse("openai:gpt-4o-mini").expect("parse failed");

	assert_eq!(parsed.provider, "openai");
	assert_eq!(parsed.model_id, "gpt-4o-mini");
	assert_eq!(parsed.to_string(), "openai:gpt-4o-mini");
}

#[test]
fn rejects_malformed_model_strings() {
	for raw in ["gpt-4o", "openai:", ":gpt-4o", "a:b:c", ""] {
		match ModelString::parse(raw) {
			Err(Error::InvalidModelString { raw: reported }) => assert_eq!(reported, raw),
			other => panic!("Expected rejection for {raw:?}, got {other:?}"),
		}
	}
}

#[test]
fn classifies_agent_suffix() {
	let class = classify::classify("rag_agent", "openai:gpt-4o-mini");

	assert_eq!(class, ServiceClass::Agent);
	assert_eq!(class.category(), "agent");
	assert_eq!(class.model_type(), "llm");
	assert!(class.supports_temperature());
}

#[test]
fn classifies_agent_prefix() {
	assert_eq!(classify::classify("agent_router", "openai:gpt-4o"), ServiceClass::Agent);
}

#[test]
fn classifies_embedding_by_name_or_model() {
	let by_name = classify::classify("embedding", "google:text-embedding-004");

	assert_eq!(by_name, ServiceClass::EmbeddingService);
	assert_eq!(by_name.category(), "service");
	assert_eq!(by_name.service_type(), "embedding-service");
	assert_eq!(by_name.model_type(), "embedding");
	assert!(!by_name.supports_temperature());

	let by_model = classify::classify("contextual", "openai:text-embedding-3-small");

	assert_eq!(by_model, ServiceClass::EmbeddingService);
}

#[test]
fn classifies_everything_else_as_backend() {
	let class = classify::classify("source_summary", "openai:gpt-4o-mini");

	assert_eq!(class, ServiceClass::BackendService);
	assert_eq!(class.service_type(), "backend-service");
	assert_eq!(class.model_type(), "llm");
}

#[test]
fn agent_affix_wins_over_embedding_substring() {
	// The documented fragility of the heuristic: affix checks run first.
	assert_eq!(
		classify::classify("embedding_agent", "google:text-embedding-004"),
		ServiceClass::Agent
	);
}

#[test]
fn derives_display_names() {
	assert_eq!(classify::display_name("rag_agent"), "Rag Agent");
	assert_eq!(classify::display_name("embedding"), "Embedding");
	assert_eq!(classify::display_name("source_summary_service"), "Source Summary Service");
}

#[test]
fn staleness_requires_matching_source_and_old_touch() {
	let sync_started = datetime!(2025-06-01 12:00 UTC);
	let before = datetime!(2025-06-01 11:59 UTC);
	let after = datetime!(2025-06-01 12:01 UTC);

	assert!(catalog::is_stale("synced", before, "synced", sync_started));
	assert!(!catalog::is_stale("synced", after, "synced", sync_started));
	assert!(!catalog::is_stale("manual", before, "synced", sync_started));
	assert!(!catalog::is_stale("local", before, "synced", sync_started));
	// Touched exactly at the pass start counts as touched by the pass.
	assert!(!catalog::is_stale("synced", sync_started, "synced", sync_started));
}

#[test]
fn cost_tiers() {
	assert_eq!(catalog::cost_tier(0.0, 0.0), CostTier::Free);
	// Free pricing on input alone is not free if output is charged.
	assert_eq!(catalog::cost_tier(0.0, 0.6), CostTier::Low);
	assert_eq!(catalog::cost_tier(0.15, 0.6), CostTier::Low);
	// $0.50/M input is the low/medium boundary, $5/M the medium/high one.
	assert_eq!(catalog::cost_tier(0.5, 1.5), CostTier::Medium);
	assert_eq!(catalog::cost_tier(0.75, 3.0), CostTier::Medium);
	assert_eq!(catalog::cost_tier(3.0, 15.0), CostTier::Medium);
	assert_eq!(catalog::cost_tier(5.0, 25.0), CostTier::High);
	assert_eq!(catalog::cost_tier(15.0, 75.0), CostTier::High);
}

#[test]
fn day_bucket_truncates_to_utc_midnight() {
	let (start, end) = usage::day_bucket(datetime!(2025-06-01 17:45:12 UTC));

	assert_eq!(start, datetime!(2025-06-01 00:00 UTC));
	assert_eq!(end, datetime!(2025-06-02 00:00 UTC));

	// Timestamps in other offsets bucket by their UTC day.
	let (start, _) = usage::day_bucket(datetime!(2025-06-01 22:30 -05:00));

	assert_eq!(start, datetime!(2025-06-02 00:00 UTC));
}
