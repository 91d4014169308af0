use serde_json::Value;
use time::OffsetDateTime;

use helm_domain::model_string::ModelString;
use helm_storage::vectors::{self, ChunkWrite, ReadFilters};

use crate::{Error, HelmService, Result};

#[derive(Clone, Debug)]
pub struct VectorWrite {
	pub source_id: String,
	pub url: String,
	pub chunk_number: i32,
	pub content: String,
	pub metadata: Value,
	pub vector: Vec<f32>,
	pub embedding_model: String,
}

/// How a store serves reads, fixed at provisioning time by the generated schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexPolicy {
	Approximate,
	FullScan,
}

/// One chunk from the cross-store read, tagged with the store's dimension.
#[derive(Clone, Debug)]
pub struct ChunkHit {
	pub source_id: String,
	pub url: String,
	pub chunk_number: i32,
	pub content: String,
	pub metadata: Value,
	pub embedding_model: String,
	pub dimensions: u32,
	pub vector: Vec<f32>,
	pub created_at: OffsetDateTime,
}

impl HelmService {
	/// Routes by the vector's length: the write lands in the one store provisioned for that
	/// width, or fails with `UnsupportedDimension` before touching storage.
	pub async fn write_chunk(&self, chunk: &VectorWrite) -> Result<()> {
		if chunk.source_id.trim().is_empty() || chunk.url.trim().is_empty() {
			return Err(Error::Validation {
				message: "source_id and url are required.".to_string(),
			});
		}

		ModelString::parse(&chunk.embedding_model)?;

		let table = self.dimensions.resolve(chunk.vector.len() as u32)?;
		let write = ChunkWrite {
			source_id: &chunk.source_id,
			url: &chunk.url,
			chunk_number: chunk.chunk_number,
			content: &chunk.content,
			metadata: &chunk.metadata,
			vector: &chunk.vector,
			embedding_model: &chunk.embedding_model,
		};

		vectors::upsert_chunk(&self.db.pool, table, &write).await?;

		Ok(())
	}

	/// Chunks in a batch are independent writes; a failure affects only its own slot and the
	/// caller retries failed slots individually.
	pub async fn write_chunks(&self, chunks: &[VectorWrite]) -> Vec<Result<()>> {
		let mut results = Vec::with_capacity(chunks.len());

		for chunk in chunks {
			let result = self.write_chunk(chunk).await;

			if let Err(err) = &result {
				tracing::warn!(
					url = %chunk.url,
					chunk_number = chunk.chunk_number,
					error = %err,
					"Chunk write failed.",
				);
			}

			results.push(result);
		}

		results
	}

	/// Reads a source's chunks across every provisioned store through the unioned view. The
	/// fan-out is bounded by the fixed store count; no similarity ranking happens here.
	pub async fn unified_read(
		&self,
		source_id: &str,
		filters: &ReadFilters,
	) -> Result<Vec<ChunkHit>> {
		let rows = vectors::read_unified(&self.db.pool, source_id, filters).await?;
		let mut hits = Vec::with_capacity(rows.len());

		for row in rows {
			let vector = vectors::chunk_vector(&row)?;

			hits.push(ChunkHit {
				source_id: row.source_id,
				url: row.url,
				chunk_number: row.chunk_number,
				content: row.content,
				metadata: row.metadata,
				embedding_model: row.embedding_model,
				dimensions: row.embedding_dim as u32,
				vector,
				created_at: row.created_at,
			});
		}

		Ok(hits)
	}

	/// Removes a url's chunks from every store. Stores fail independently; the first failure
	/// surfaces and the sweep is re-runnable from scratch.
	pub async fn delete_chunks_by_url(&self, url: &str) -> Result<u64> {
		let mut deleted = 0;

		for table in self.dimensions.tables() {
			deleted += vectors::delete_by_url(&self.db.pool, table, url).await?;
		}

		if deleted > 0 {
			tracing::info!(url, deleted, "Deleted chunks across vector stores.");
		}

		Ok(deleted)
	}

	pub fn index_policy(&self, dimensions: u32) -> Result<IndexPolicy> {
		let table = self.dimensions.resolve(dimensions)?;

		Ok(if table.indexed { IndexPolicy::Approximate } else { IndexPolicy::FullScan })
	}
}
