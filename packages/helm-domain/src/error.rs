#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid model string {raw:?}: expected exactly one ':' with non-empty sides.")]
	InvalidModelString { raw: String },
}
