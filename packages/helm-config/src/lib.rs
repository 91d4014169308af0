mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Catalog, Config, Embedding, Postgres, Service, Storage, Vault};

use std::{fs, path::Path};

use base64::Engine;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	master_key_bytes(&cfg.vault)?;

	if cfg.vault.secret_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "vault.secret_ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.vault.probe_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "vault.probe_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.embedding.dimensions.is_empty() {
		return Err(Error::Validation {
			message: "embedding.dimensions must be non-empty.".to_string(),
		});
	}
	if cfg.embedding.dimensions.iter().any(|dim| *dim == 0) {
		return Err(Error::Validation {
			message: "embedding.dimensions entries must be greater than zero.".to_string(),
		});
	}
	if !cfg.embedding.dimensions.is_sorted() {
		return Err(Error::Validation {
			message: "embedding.dimensions must be in ascending order.".to_string(),
		});
	}
	if cfg.embedding.dimensions.windows(2).any(|pair| pair[0] == pair[1]) {
		return Err(Error::Validation {
			message: "embedding.dimensions must not contain duplicates.".to_string(),
		});
	}
	if cfg.embedding.index_max_dim == 0 {
		return Err(Error::Validation {
			message: "embedding.index_max_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.catalog.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "catalog.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.catalog.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "catalog.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

/// Decodes the vault master key, enforcing the 32-byte length the cipher requires.
pub fn master_key_bytes(vault: &Vault) -> Result<[u8; 32]> {
	let decoded =
		base64::engine::general_purpose::STANDARD.decode(&vault.master_key).map_err(|_| {
			Error::Validation { message: "vault.master_key must be valid base64.".to_string() }
		})?;

	decoded.try_into().map_err(|_| Error::Validation {
		message: "vault.master_key must decode to exactly 32 bytes.".to_string(),
	})
}
