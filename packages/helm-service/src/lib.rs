pub mod catalog;
pub mod configure;
pub mod registry;
pub mod usage;
pub mod vault;
pub mod vectors;

mod error;
mod retry;

use std::time::Duration;

pub use catalog::{CatalogModel, SyncModelRequest, SyncReport};
pub use configure::{StoredModelConfig, UpsertConfigRequest};
pub use error::{Error, Result};
pub use registry::{DeprecatedUsage, RegisterServiceRequest, RegistryStatistics, RegistryValidation};
pub use usage::{RecordUsageRequest, UsageSummary};
pub use vault::KeyStatus;
pub use vectors::{ChunkHit, IndexPolicy, VectorWrite};

use helm_config::Config;
use helm_storage::{db::Db, vectors::DimensionMap};
use helm_vault::Cipher;

pub struct HelmService {
	pub cfg: Config,
	pub db: Db,
	cipher: Cipher,
	dimensions: DimensionMap,
	http: reqwest::Client,
	secrets: vault::SecretCache,
	syncing: catalog::SyncGuard,
}
impl HelmService {
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		let master_key = helm_config::master_key_bytes(&cfg.vault)?;
		let dimensions = DimensionMap::new(&cfg.embedding);
		// Request deadlines differ per call site (probe vs catalog fetch), so the client
		// carries no default timeout.
		let http = reqwest::Client::builder().build()?;
		let secrets = vault::SecretCache::new(Duration::from_secs(cfg.vault.secret_ttl_secs));

		Ok(Self {
			cipher: Cipher::new(master_key),
			dimensions,
			http,
			secrets,
			syncing: catalog::SyncGuard::default(),
			cfg,
			db,
		})
	}

	/// Bootstraps the schema for every provisioned dimension.
	pub async fn ensure_schema(&self) -> Result<()> {
		self.db.ensure_schema(&self.dimensions).await?;

		Ok(())
	}

	pub fn dimensions(&self) -> &DimensionMap {
		&self.dimensions
	}
}
