use sqlx::PgExecutor;

use crate::{Error, Result, models::ChunkEmbeddingRow};

/// One physical vector store. The table name is fixed by convention on the dimension; whether
/// the store carries an approximate index is decided at provisioning time, never at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DimensionTable {
	pub dimensions: u32,
	pub table: String,
	pub indexed: bool,
}

/// The dimension → physical store map. Built once from configuration; adding a supported
/// width is a configuration change plus a schema bootstrap, not new code.
#[derive(Clone, Debug)]
pub struct DimensionMap {
	entries: Vec<DimensionTable>,
}
impl DimensionMap {
	pub fn new(cfg: &helm_config::Embedding) -> Self {
		let entries = cfg
			.dimensions
			.iter()
			.map(|&dimensions| DimensionTable {
				dimensions,
				table: format!("chunk_embeddings_{dimensions}"),
				indexed: dimensions <= cfg.index_max_dim,
			})
			.collect();

		Self { entries }
	}

	/// Total on the provisioned set, fails outside it. A miss is an operator problem (a new
	/// store must be provisioned), not something to retry.
	pub fn resolve(&self, dimensions: u32) -> Result<&DimensionTable> {
		self.entries.iter().find(|entry| entry.dimensions == dimensions).ok_or_else(|| {
			Error::UnsupportedDimension { dimensions, supported: self.supported() }
		})
	}

	pub fn tables(&self) -> impl Iterator<Item = &DimensionTable> {
		self.entries.iter()
	}

	pub fn supported(&self) -> Vec<u32> {
		self.entries.iter().map(|entry| entry.dimensions).collect()
	}
}

/// Renders a vector in the Postgres `vector` literal form, `[v1,v2,...]`.
pub fn format_vector(vector: &[f32]) -> String {
	let mut out = String::with_capacity(vector.len() * 8 + 2);

	out.push('[');

	for (index, value) in vector.iter().enumerate() {
		if index > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub fn parse_vector(raw: &str) -> Result<Vec<f32>> {
	let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');

	if trimmed.is_empty() {
		return Ok(Vec::new());
	}

	trimmed
		.split(',')
		.map(|part| {
			part.trim()
				.parse::<f32>()
				.map_err(|_| Error::InvalidArgument(format!("Bad vector literal: {raw:?}.")))
		})
		.collect()
}

pub struct ChunkWrite<'a> {
	pub source_id: &'a str,
	pub url: &'a str,
	pub chunk_number: i32,
	pub content: &'a str,
	pub metadata: &'a serde_json::Value,
	pub vector: &'a [f32],
	pub embedding_model: &'a str,
}

/// Upserts one chunk into the given store. The key includes the embedding model, so
/// re-embedding the same chunk under another model coexists instead of overwriting, and the
/// prior index survives a model migration until explicitly pruned.
pub async fn upsert_chunk<'e, E>(executor: E, table: &DimensionTable, chunk: &ChunkWrite<'_>) -> Result<()>
where
	E: PgExecutor<'e>,
{
	// Table names come from the trusted DimensionMap, never from callers.
	let sql = format!(
		"\
INSERT INTO {table} (source_id, url, chunk_number, content, metadata, embedding_model, embedding)
VALUES ($1, $2, $3, $4, $5, $6, $7::text::vector)
ON CONFLICT (url, chunk_number, embedding_model) DO UPDATE
SET
	source_id = EXCLUDED.source_id,
	content = EXCLUDED.content,
	metadata = EXCLUDED.metadata,
	embedding = EXCLUDED.embedding,
	created_at = now()",
		table = table.table,
	);

	sqlx::query(&sql)
		.bind(chunk.source_id)
		.bind(chunk.url)
		.bind(chunk.chunk_number)
		.bind(chunk.content)
		.bind(chunk.metadata)
		.bind(chunk.embedding_model)
		.bind(format_vector(chunk.vector))
		.execute(executor)
		.await?;

	Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct ReadFilters {
	pub url: Option<String>,
	pub embedding_model: Option<String>,
}

/// Reads across every provisioned store through the unioned view, each hit tagged with its
/// dimension. The fan-out is bounded by the fixed number of stores. No similarity ranking
/// happens here; rows come back in insertion-key order.
pub async fn read_unified<'e, E>(
	executor: E,
	source_id: &str,
	filters: &ReadFilters,
) -> Result<Vec<ChunkEmbeddingRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ChunkEmbeddingRow>(
		"\
SELECT
	id,
	source_id,
	url,
	chunk_number,
	content,
	metadata,
	embedding_model,
	embedding_dim,
	embedding,
	created_at
FROM chunk_embeddings_all
WHERE source_id = $1
	AND ($2::text IS NULL OR url = $2)
	AND ($3::text IS NULL OR embedding_model = $3)
ORDER BY url, chunk_number, embedding_dim",
	)
	.bind(source_id)
	.bind(filters.url.as_deref())
	.bind(filters.embedding_model.as_deref())
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Removes a url's chunks from one store. Callers sweep every store; per-store failures are
/// retryable independently.
pub async fn delete_by_url<'e, E>(executor: E, table: &DimensionTable, url: &str) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let sql = format!("DELETE FROM {table} WHERE url = $1", table = table.table);
	let result = sqlx::query(&sql).bind(url).execute(executor).await?;

	Ok(result.rows_affected())
}

pub fn chunk_vector(row: &ChunkEmbeddingRow) -> Result<Vec<f32>> {
	parse_vector(&row.embedding)
}
