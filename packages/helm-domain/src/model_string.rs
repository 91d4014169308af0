use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A `"provider:model_id"` identifier. The separator appears exactly once and both sides are
/// non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelString {
	pub provider: String,
	pub model_id: String,
}
impl ModelString {
	pub fn parse(raw: &str) -> Result<Self> {
		let mut parts = raw.split(':');
		let (Some(provider), Some(model_id), None) = (parts.next(), parts.next(), parts.next())
		else {
			return Err(Error::InvalidModelString { raw: raw.to_string() });
		};

		if provider.is_empty() || model_id.is_empty() {
			return Err(Error::InvalidModelString { raw: raw.to_string() });
		}

		Ok(Self { provider: provider.to_string(), model_id: model_id.to_string() })
	}
}
impl fmt::Display for ModelString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.provider, self.model_id)
	}
}
