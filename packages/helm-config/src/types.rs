use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub vault: Vault,
	pub embedding: Embedding,
	pub catalog: Catalog,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Vault {
	/// Base64 of exactly 32 bytes. Held by the server, never stored alongside the rows it
	/// protects.
	pub master_key: String,
	pub secret_ttl_secs: u64,
	pub probe_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Embedding {
	/// The provisioned vector widths. One physical store exists per entry.
	pub dimensions: Vec<u32>,
	/// Widths above this limit get no approximate index and are served by full scan.
	pub index_max_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
}
