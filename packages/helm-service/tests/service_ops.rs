use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use helm_config::{Catalog, Config, Embedding, Postgres, Service, Storage, Vault};
use helm_service::{
	Error, HelmService, IndexPolicy, RecordUsageRequest, RegisterServiceRequest,
	SyncModelRequest, UpsertConfigRequest, VectorWrite,
};
use helm_storage::{catalog::ModelFilters, db::Db, vectors::ReadFilters};
use helm_testkit::TestDatabase;

// 32 zero bytes.
const TEST_MASTER_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

const SKIP_NOTE: &str = "set HELM_PG_DSN to run";

fn test_config(dsn: &str) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 8 },
		},
		vault: Vault {
			master_key: TEST_MASTER_KEY.to_string(),
			secret_ttl_secs: 60,
			probe_timeout_ms: 500,
		},
		embedding: Embedding { dimensions: vec![3, 5, 768, 1536], index_max_dim: 1000 },
		catalog: Catalog {
			api_base: "https://openrouter.ai/api".to_string(),
			path: "/v1/models".to_string(),
			timeout_ms: 5_000,
		},
	}
}

async fn service_for(test_db: &TestDatabase) -> HelmService {
	let cfg = test_config(test_db.dsn());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");
	let service = HelmService::new(cfg, db).expect("Failed to build service.");

	service.ensure_schema().await.expect("Failed to bootstrap schema.");

	service
}

fn config_request(service_name: &str, model_string: &str) -> UpsertConfigRequest {
	UpsertConfigRequest {
		service_name: service_name.to_string(),
		model_string: model_string.to_string(),
		temperature: None,
		max_tokens: None,
		embedding_dimensions: None,
		batch_size: None,
		supports_dimensions_param: None,
		optimal_batch_size: None,
		cost_per_million_tokens: None,
		max_input_tokens: None,
		updated_by: None,
	}
}

fn sync_request(provider: &str, model_id: &str, source: &str) -> SyncModelRequest {
	SyncModelRequest {
		provider: provider.to_string(),
		model_id: model_id.to_string(),
		display_name: None,
		description: None,
		context_length: None,
		input_cost: None,
		output_cost: None,
		supports_vision: false,
		supports_tools: false,
		supports_reasoning: false,
		is_embedding: false,
		source: source.to_string(),
	}
}

fn chunk(source_id: &str, url: &str, number: i32, vector: Vec<f32>, model: &str) -> VectorWrite {
	VectorWrite {
		source_id: source_id.to_string(),
		url: url.to_string(),
		chunk_number: number,
		content: format!("chunk {number} of {url}"),
		metadata: serde_json::json!({ "url": url }),
		vector,
		embedding_model: model.to_string(),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn configure_derives_and_preserves_registry_entries() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping configure_derives_and_preserves_registry_entries; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;

	// A fresh configuration derives a full registry entry.
	let stored = service
		.upsert_config(config_request("rag_agent", "openai:gpt-4o"))
		.await
		.expect("Failed to upsert config.");

	assert_eq!(stored.provider_name, "openai");
	assert_eq!(stored.model_id, "gpt-4o");

	let entry = service.get_service("rag_agent").await.expect("Registry entry missing.");

	assert_eq!(entry.display_name, "Rag Agent");
	assert_eq!(entry.category, "agent");
	assert_eq!(entry.service_type, "model-driven-agent");
	assert_eq!(entry.icon.as_deref(), Some("🤖"));
	assert_eq!(entry.default_model.as_deref(), Some("openai:gpt-4o"));

	// An operator edit to the display fields...
	let registration = RegisterServiceRequest {
		service_name: "rag_agent".to_string(),
		display_name: "Retrieval Agent".to_string(),
		description: Some("Hand-tuned description.".to_string()),
		icon: entry.icon.clone(),
		category: entry.category.clone(),
		service_type: entry.service_type.clone(),
		model_type: entry.model_type.clone(),
		location: entry.location.clone(),
		supports_temperature: entry.supports_temperature,
		supports_max_tokens: entry.supports_max_tokens,
		default_model: entry.default_model.clone(),
		cost_profile: entry.cost_profile.clone(),
		owner_team: Some("search".to_string()),
		contact_email: None,
		documentation_url: None,
	};

	service.register_service(registration).await.expect("Failed to register.");

	// ...survives a configuration refresh: only the default model moves.
	service
		.upsert_config(config_request("rag_agent", "anthropic:claude-sonnet"))
		.await
		.expect("Failed to re-upsert config.");

	let refreshed = service.get_service("rag_agent").await.expect("Registry entry missing.");

	assert_eq!(refreshed.display_name, "Retrieval Agent");
	assert_eq!(refreshed.owner_team.as_deref(), Some("search"));
	assert_eq!(refreshed.default_model.as_deref(), Some("anthropic:claude-sonnet"));

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn embedding_config_requires_provisioned_dimension() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping embedding_config_requires_provisioned_dimension; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;
	let mut missing = config_request("embedding_service", "openai:text-embedding-3-small");

	assert!(matches!(
		service.upsert_config(missing.clone()).await,
		Err(Error::Validation { .. })
	));

	missing.embedding_dimensions = Some(999);
	assert!(matches!(
		service.upsert_config(missing.clone()).await,
		Err(Error::UnsupportedDimension { dimensions: 999, .. })
	));

	missing.embedding_dimensions = Some(768);

	let stored = service.upsert_config(missing).await.expect("Failed to upsert config.");

	assert_eq!(stored.config.embedding_dimensions, Some(768));

	let entry = service.get_service("embedding_service").await.expect("Entry missing.");

	assert_eq!(entry.service_type, "embedding-service");
	assert!(!entry.supports_temperature);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn deleted_config_surfaces_as_unconfigured() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping deleted_config_surfaces_as_unconfigured; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;

	service
		.upsert_config(config_request("summarizer", "openai:gpt-4o-mini"))
		.await
		.expect("Failed to upsert config.");
	service.delete_config("summarizer").await.expect("Failed to delete config.");

	assert!(matches!(service.get_config("summarizer").await, Err(Error::NotFound { .. })));
	// The registry entry survives deletion and shows up in the health report.
	assert!(service.get_service("summarizer").await.is_ok());

	let report = service.validate_registry().await.expect("Failed to validate registry.");

	assert!(report.unconfigured.iter().any(|entry| entry.service_name == "summarizer"));
	assert!(!report.is_healthy());

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn vault_roundtrip_deactivate_and_rotate() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping vault_roundtrip_deactivate_and_rotate; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;

	service.set_key("openai", "sk-live-1", None, None).await.expect("Failed to set key.");

	assert_eq!(service.get_key("openai").await.expect("Failed to get key."), "sk-live-1");

	// The stored blob is ciphertext, never the plaintext.
	let stored: String = sqlx::query_scalar(
		"SELECT encrypted_secret FROM provider_credentials WHERE provider = 'openai'",
	)
	.fetch_one(&service.db.pool)
	.await
	.expect("Failed to read stored credential.");

	assert_ne!(stored, "sk-live-1");
	assert!(!stored.contains("sk-live-1"));

	// The default endpoint table fills in the base url.
	let base_url: Option<String> =
		sqlx::query_scalar("SELECT base_url FROM provider_credentials WHERE provider = 'openai'")
			.fetch_one(&service.db.pool)
			.await
			.expect("Failed to read base url.");

	assert_eq!(base_url.as_deref(), Some("https://api.openai.com/v1"));

	service.rotate_key("openai", "sk-live-2").await.expect("Failed to rotate key.");
	assert_eq!(service.get_key("openai").await.expect("Failed to get key."), "sk-live-2");

	service.deactivate_key("openai").await.expect("Failed to deactivate key.");
	assert!(matches!(service.get_key("openai").await, Err(Error::NotConfigured { .. })));
	assert!(matches!(service.get_key("anthropic").await, Err(Error::NotConfigured { .. })));
	assert!(matches!(
		service.rotate_key("mistral", "sk-x").await,
		Err(Error::NotFound { .. })
	));

	// Re-setting reactivates the provider.
	service.set_key("openai", "sk-live-3", None, None).await.expect("Failed to re-set key.");
	assert_eq!(service.get_key("openai").await.expect("Failed to get key."), "sk-live-3");

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn sync_is_idempotent_and_sweep_targets_one_source() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping sync_is_idempotent_and_sweep_targets_one_source; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;

	service
		.sync_model(&sync_request("openai", "gpt-4o", "openrouter"))
		.await
		.expect("Failed to sync model.");
	service
		.sync_model(&sync_request("openai", "gpt-4o", "openrouter"))
		.await
		.expect("Failed to re-sync model.");
	service
		.sync_model(&sync_request("ollama", "llama3.1:latest", "local"))
		.await
		.expect_err("':' in model_id must be rejected.");
	service
		.sync_model(&sync_request("ollama", "llama3.1", "local"))
		.await
		.expect("Failed to sync local model.");

	let all = service.list_models(&ModelFilters::default()).await.expect("Failed to list.");

	assert_eq!(all.len(), 2, "idempotent upsert must not duplicate rows");

	let synced = service.get_model("openai", "gpt-4o").await.expect("Model missing.");

	assert_eq!(synced.model_string, "openai:gpt-4o");
	assert!(synced.is_active);

	// A later pass that never touches the row sweeps it; the local row is exempt.
	let sweep_start = OffsetDateTime::now_utc() + Duration::seconds(1);
	let swept = service.complete_sync("openrouter", sweep_start).await.expect("Sweep failed.");

	assert_eq!(swept, 1);

	let active_only = ModelFilters { active_only: true, ..ModelFilters::default() };
	let active = service.list_models(&active_only).await.expect("Failed to list.");

	assert_eq!(active.len(), 1);
	assert_eq!(active[0].provider, "ollama");

	// Reappearing upstream revives the swept row.
	service
		.sync_model(&sync_request("openai", "gpt-4o", "openrouter"))
		.await
		.expect("Failed to revive model.");
	assert!(service.get_model("openai", "gpt-4o").await.expect("Model missing.").is_active);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn concurrent_usage_recording_loses_nothing() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping concurrent_usage_recording_loses_nothing; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = Arc::new(service_for(&test_db).await);
	let at = OffsetDateTime::now_utc();
	let mut handles = Vec::new();

	for _ in 0..20 {
		let service = Arc::clone(&service);

		handles.push(tokio::spawn(async move {
			service
				.record_usage(&RecordUsageRequest {
					service_name: "rag_agent".to_string(),
					model_string: "openai:gpt-4o".to_string(),
					tokens: 100,
					cost: 0.25,
					at: Some(at),
				})
				.await
		}));
	}

	for handle in handles {
		handle.await.expect("Recorder task panicked.").expect("Failed to record usage.");
	}

	let summary = service.usage_summary(Some("rag_agent")).await.expect("Summary failed.");

	assert_eq!(summary.request_count, 20);
	assert_eq!(summary.total_tokens, 2_000);
	assert!((summary.estimated_cost - 5.0).abs() < 1e-9);
	assert!((summary.avg_tokens_per_request - 100.0).abs() < f64::EPSILON);

	let daily = service
		.daily_costs(at - Duration::days(1))
		.await
		.expect("Failed to fetch daily costs.");

	// Every aggregate column must come back in its row type, not as NUMERIC.
	assert_eq!(daily.len(), 1);
	assert_eq!(daily[0].request_count, 20);
	assert_eq!(daily[0].total_tokens, 2_000);
	assert!((daily[0].estimated_cost - 5.0).abs() < 1e-9);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn monthly_cost_projects_from_the_trailing_window() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping monthly_cost_projects_from_the_trailing_window; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;
	let now = OffsetDateTime::now_utc();

	assert!(matches!(
		service.estimate_monthly_cost(0).await,
		Err(Error::Validation { .. })
	));

	service
		.record_usage(&RecordUsageRequest {
			service_name: "rag_agent".to_string(),
			model_string: "openai:gpt-4o".to_string(),
			tokens: 1_000,
			cost: 3.0,
			at: Some(now),
		})
		.await
		.expect("Failed to record usage.");
	// A bucket outside the trailing window must not inflate the projection.
	service
		.record_usage(&RecordUsageRequest {
			service_name: "rag_agent".to_string(),
			model_string: "openai:gpt-4o".to_string(),
			tokens: 1_000,
			cost: 100.0,
			at: Some(now - Duration::days(10)),
		})
		.await
		.expect("Failed to record old usage.");

	let projected = service.estimate_monthly_cost(1).await.expect("Projection failed.");

	// $3 over one observed day extrapolates to $90 over thirty.
	assert!((projected - 90.0).abs() < 1e-9);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn deprecation_needs_replacement_and_hides_from_active_lists() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping deprecation_needs_replacement_and_hides_from_active_lists; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;

	service
		.upsert_config(config_request("old_agent", "openai:gpt-4"))
		.await
		.expect("Failed to upsert config.");
	service
		.upsert_config(config_request("new_agent", "openai:gpt-4o"))
		.await
		.expect("Failed to upsert config.");

	assert!(matches!(
		service.deprecate_service("old_agent", "Superseded.", "").await,
		Err(Error::Validation { .. })
	));

	service
		.deprecate_service("old_agent", "Superseded.", "new_agent")
		.await
		.expect("Failed to deprecate.");

	let active = service.list_services(true, None).await.expect("Failed to list services.");

	assert!(active.iter().all(|entry| entry.service_name != "old_agent"));
	// Still individually retrievable.
	assert!(service.get_service("old_agent").await.expect("Entry missing.").is_deprecated);

	// Traffic on the deprecated service shows up in the health report.
	service
		.record_usage(&RecordUsageRequest {
			service_name: "old_agent".to_string(),
			model_string: "openai:gpt-4".to_string(),
			tokens: 10,
			cost: 0.01,
			at: None,
		})
		.await
		.expect("Failed to record usage.");

	let report = service.validate_registry().await.expect("Failed to validate registry.");

	assert!(
		report
			.deprecated_in_use
			.iter()
			.any(|usage| usage.service_name == "old_agent"
				&& usage.replacement_service.as_deref() == Some("new_agent"))
	);

	let stats = service.registry_statistics().await.expect("Failed to fetch statistics.");

	assert_eq!(stats.total, 2);
	assert_eq!(stats.deprecated, 1);
	assert!(stats.by_category.iter().any(|(category, count)| category == "agent" && *count == 1));

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set HELM_PG_DSN to run."]
async fn vector_routing_and_unified_read() {
	let Some(base_dsn) = helm_testkit::env_dsn() else {
		eprintln!("Skipping vector_routing_and_unified_read; {SKIP_NOTE}.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_for(&test_db).await;
	let url = "https://docs.example.com/intro";

	// Same corpus embedded under two widths, plus a second model on the same chunk key.
	service
		.write_chunk(&chunk("docs", url, 0, vec![0.1, 0.2, 0.3], "acme:small-3"))
		.await
		.expect("Failed to write 3-wide chunk.");
	service
		.write_chunk(&chunk("docs", url, 0, vec![0.1, 0.2, 0.3, 0.4, 0.5], "acme:wide-5"))
		.await
		.expect("Failed to write 5-wide chunk.");
	service
		.write_chunk(&chunk("docs", url, 1, vec![0.9, 0.8, 0.7], "acme:small-3"))
		.await
		.expect("Failed to write second chunk.");

	// An unprovisioned width never reaches storage.
	assert!(matches!(
		service.write_chunk(&chunk("docs", url, 2, vec![0.0; 7], "acme:odd-7")).await,
		Err(Error::UnsupportedDimension { dimensions: 7, .. })
	));

	let hits = service
		.unified_read("docs", &ReadFilters::default())
		.await
		.expect("Failed to read chunks.");

	assert_eq!(hits.len(), 3);
	assert!(hits.iter().any(|hit| hit.dimensions == 5 && hit.embedding_model == "acme:wide-5"));
	assert!(
		hits.iter()
			.filter(|hit| hit.chunk_number == 0)
			.count() == 2,
		"re-embedding under another model must coexist",
	);

	let filtered = service
		.unified_read(
			"docs",
			&ReadFilters {
				url: None,
				embedding_model: Some("acme:small-3".to_string()),
			},
		)
		.await
		.expect("Failed to read filtered chunks.");

	assert_eq!(filtered.len(), 2);
	assert_eq!(filtered[0].vector.len(), 3);

	// Overwrite beats duplicate on the same (url, chunk, model) key.
	service
		.write_chunk(&chunk("docs", url, 1, vec![0.5, 0.5, 0.5], "acme:small-3"))
		.await
		.expect("Failed to overwrite chunk.");

	let after = service
		.unified_read("docs", &ReadFilters::default())
		.await
		.expect("Failed to re-read chunks.");

	assert_eq!(after.len(), 3);

	// Index policy follows the provisioning-time width limit.
	assert_eq!(service.index_policy(768).expect("policy"), IndexPolicy::Approximate);
	assert_eq!(service.index_policy(1536).expect("policy"), IndexPolicy::FullScan);

	// The url sweep crosses every store.
	let deleted = service.delete_chunks_by_url(url).await.expect("Failed to delete chunks.");

	assert_eq!(deleted, 3);
	assert!(
		service
			.unified_read("docs", &ReadFilters::default())
			.await
			.expect("Failed to read chunks.")
			.is_empty()
	);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
