use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceClass {
	Agent,
	EmbeddingService,
	BackendService,
}
impl ServiceClass {
	/// Coarse registry grouping: agents on one side, everything else on the other.
	pub fn category(&self) -> &'static str {
		match self {
			Self::Agent => "agent",
			Self::EmbeddingService | Self::BackendService => "service",
		}
	}

	pub fn service_type(&self) -> &'static str {
		match self {
			Self::Agent => "model-driven-agent",
			Self::EmbeddingService => "embedding-service",
			Self::BackendService => "backend-service",
		}
	}

	pub fn model_type(&self) -> &'static str {
		match self {
			Self::EmbeddingService => "embedding",
			Self::Agent | Self::BackendService => "llm",
		}
	}

	pub fn location(&self) -> &'static str {
		match self {
			Self::Agent => "agents_server",
			Self::EmbeddingService | Self::BackendService => "main_server",
		}
	}

	pub fn supports_temperature(&self) -> bool {
		!matches!(self, Self::EmbeddingService)
	}

	pub fn supports_max_tokens(&self) -> bool {
		!matches!(self, Self::EmbeddingService)
	}

	pub fn icon(&self) -> &'static str {
		match self {
			Self::Agent => "🤖",
			Self::EmbeddingService => "🧩",
			Self::BackendService => "🔧",
		}
	}

	pub fn is_embedding(&self) -> bool {
		matches!(self, Self::EmbeddingService)
	}
}

/// Name-pattern heuristic used by registry derivation.
///
/// Known limitation, preserved for compatibility with existing registry rows: the match is a
/// plain substring test, so a backend service whose name merely contains "embedding" (or
/// carries an agent-style affix) gets the wrong class.
pub fn classify(service_name: &str, model_string: &str) -> ServiceClass {
	if service_name.ends_with("_agent") || service_name.starts_with("agent_") {
		ServiceClass::Agent
	} else if service_name.contains("embedding") || model_string.contains("embedding") {
		ServiceClass::EmbeddingService
	} else {
		ServiceClass::BackendService
	}
}

/// Turns `"rag_agent"` into `"Rag Agent"`.
pub fn display_name(service_name: &str) -> String {
	service_name
		.split('_')
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();

			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}
