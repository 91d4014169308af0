pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	Validation { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Not configured: {message}")]
	NotConfigured { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Unsupported embedding dimension {dimensions}. Provisioned: {supported:?}.")]
	UnsupportedDimension { dimensions: u32, supported: Vec<u32> },
	#[error("Decryption error: {message}")]
	Decryption { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("HTTP error: {message}")]
	Http { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<helm_storage::Error> for Error {
	fn from(err: helm_storage::Error) -> Self {
		match err {
			helm_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			helm_storage::Error::InvalidArgument(message) => Self::Validation { message },
			helm_storage::Error::NotFound(message) => Self::NotFound { message },
			helm_storage::Error::Conflict(message) => Self::Conflict { message },
			helm_storage::Error::UnsupportedDimension { dimensions, supported } => {
				Self::UnsupportedDimension { dimensions, supported }
			},
		}
	}
}

impl From<helm_vault::Error> for Error {
	fn from(err: helm_vault::Error) -> Self {
		Self::Decryption { message: err.to_string() }
	}
}

impl From<helm_domain::Error> for Error {
	fn from(err: helm_domain::Error) -> Self {
		Self::Validation { message: err.to_string() }
	}
}

impl From<helm_config::Error> for Error {
	fn from(err: helm_config::Error) -> Self {
		Self::Validation { message: err.to_string() }
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Self::Http { message: err.to_string() }
	}
}
