use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Catalog sync batch: fetches the external model catalog, refreshes `available_models`, and
/// sweeps the rows the pass never touched. Meant to run on a schedule.
#[derive(Debug, Parser)]
#[command(rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
	/// Catalog source to sync.
	#[arg(long, default_value = "openrouter")]
	pub source: String,
	/// Also seed the built-in local runtime models.
	#[arg(long)]
	pub seed_local: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = helm_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = helm_storage::db::Db::connect(&config.storage.postgres).await?;
	let service = helm_service::HelmService::new(config, db)?;

	service.ensure_schema().await?;

	if args.seed_local {
		let swept = service.seed_local_models().await?;

		tracing::info!(swept, "Seeded local runtime models.");
	}

	let report = service.run_sync_pass(&args.source).await?;

	tracing::info!(
		source = %report.source,
		models_synced = report.models_synced,
		models_deactivated = report.models_deactivated,
		duration_ms = report.duration.as_millis() as u64,
		"Sync pass complete.",
	);

	Ok(())
}
