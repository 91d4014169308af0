#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Unsupported embedding dimension {dimensions}. Provisioned: {supported:?}.")]
	UnsupportedDimension { dimensions: u32, supported: Vec<u32> },
}
