use crate::vectors::DimensionMap;

/// Renders the full bootstrap script: the metadata tables from `sql/`, one vector table per
/// provisioned dimension from the `<DIM>` template, and the unioned read-only view across
/// them. An approximate (ivfflat) index is emitted only for widths the index can hold; wider
/// stores are served by full scan.
pub fn render_schema(dimensions: &DimensionMap) -> String {
	let init = include_str!("../../../sql/init.sql");
	let mut out = expand_includes(init);
	let template = include_str!("../../../sql/tables/006_chunk_embeddings_dim.sql");

	for table in dimensions.tables() {
		out.push_str(&template.replace("<DIM>", &table.dimensions.to_string()));

		if table.indexed {
			out.push_str(&format!(
				"CREATE INDEX IF NOT EXISTS {table}_embedding_idx ON {table} USING ivfflat (embedding vector_cosine_ops) WITH (lists = 100);\n",
				table = table.table,
			));
		}
	}

	out.push_str(&render_union_view(dimensions));

	out
}

fn render_union_view(dimensions: &DimensionMap) -> String {
	let selects = dimensions
		.tables()
		.map(|table| {
			format!(
				"SELECT id, source_id, url, chunk_number, content, metadata, embedding_model, {dim} AS embedding_dim, embedding::text AS embedding, created_at FROM {table}",
				dim = table.dimensions,
				table = table.table,
			)
		})
		.collect::<Vec<_>>()
		.join("\nUNION ALL\n");

	format!("CREATE OR REPLACE VIEW chunk_embeddings_all AS\n{selects};\n")
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_model_config.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_model_config.sql")),
				"tables/002_provider_credentials.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_provider_credentials.sql")),
				"tables/003_service_registry.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_service_registry.sql")),
				"tables/004_available_models.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_available_models.sql")),
				"tables/005_model_usage.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_model_usage.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
