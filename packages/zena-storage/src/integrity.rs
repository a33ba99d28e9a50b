//! B-tree index verification and repair through the `amcheck` extension.
//!
//! The flow is: verify every B-tree index of the table, reindex the corrupted ones, verify
//! again, escalate to a table-wide reindex when corruption remains, and refresh statistics.
//! Repair failures are reported in the result and logged, never returned as errors.

use sqlx::PgPool;

use crate::{Error, Result, db::Db};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegrityReport {
	pub amcheck_available: bool,
	pub checked: Vec<String>,
	pub corrupted: Vec<String>,
	pub reindexed: Vec<String>,
	pub table_reindexed: bool,
	pub still_corrupted: Vec<String>,
	pub analyzed: bool,
}

impl Db {
	/// Verifies and repairs the B-tree indexes of `schema.table`, checking `priority_index` first.
	pub async fn repair_btree_indexes(
		&self,
		schema: &str,
		table: &str,
		priority_index: Option<&str>,
	) -> Result<IntegrityReport> {
		let qualified_table = qualify(schema, table)?;
		let mut report = IntegrityReport::default();

		match sqlx::query("CREATE EXTENSION IF NOT EXISTS amcheck").execute(&self.pool).await {
			Ok(_) => report.amcheck_available = true,
			Err(err) => {
				tracing::warn!(error = %err, "amcheck is unavailable. Skipping index verification.");
			},
		}

		if report.amcheck_available {
			let indexes = list_btree_indexes(&self.pool, schema, table, priority_index).await?;

			report.checked = indexes.clone();
			report.corrupted = corrupted_indexes(&self.pool, schema, &indexes).await?;

			for index in &report.corrupted {
				let sql = format!("REINDEX INDEX {}", qualify(schema, index)?);

				match sqlx::query(&sql).execute(&self.pool).await {
					Ok(_) => {
						tracing::info!(index = %index, "Corrupted index rebuilt.");

						report.reindexed.push(index.clone());
					},
					Err(err) => {
						tracing::error!(index = %index, error = %err, "Failed to rebuild index.");
					},
				}
			}

			if !report.corrupted.is_empty() {
				let remaining = corrupted_indexes(&self.pool, schema, &report.corrupted).await?;

				if !remaining.is_empty() {
					let sql = format!("REINDEX TABLE {qualified_table}");

					match sqlx::query(&sql).execute(&self.pool).await {
						Ok(_) => {
							tracing::warn!(table = %qualified_table, "Table reindexed after targeted repair failed.");

							report.table_reindexed = true;
							report.still_corrupted =
								corrupted_indexes(&self.pool, schema, &remaining).await?;
						},
						Err(err) => {
							tracing::error!(
								table = %qualified_table,
								error = %err,
								"Failed to reindex table."
							);

							report.still_corrupted = remaining;
						},
					}
				}
			}
		}

		match sqlx::query(&format!("ANALYZE {qualified_table}")).execute(&self.pool).await {
			Ok(_) => report.analyzed = true,
			Err(err) => {
				tracing::warn!(table = %qualified_table, error = %err, "Failed to refresh statistics.");
			},
		}

		Ok(report)
	}
}

async fn list_btree_indexes(
	pool: &PgPool,
	schema: &str,
	table: &str,
	priority_index: Option<&str>,
) -> Result<Vec<String>> {
	let indexes: Vec<String> = sqlx::query_scalar(
		"\
SELECT ic.relname::text
FROM pg_index i
JOIN pg_class ic ON ic.oid = i.indexrelid
JOIN pg_class tc ON tc.oid = i.indrelid
JOIN pg_namespace n ON n.oid = tc.relnamespace
JOIN pg_am am ON am.oid = ic.relam
WHERE n.nspname = $1 AND tc.relname = $2 AND am.amname = 'btree'
ORDER BY (ic.relname = $3) DESC, ic.relname",
	)
	.bind(schema)
	.bind(table)
	.bind(priority_index.unwrap_or_default())
	.fetch_all(pool)
	.await?;

	Ok(indexes)
}

async fn corrupted_indexes(pool: &PgPool, schema: &str, indexes: &[String]) -> Result<Vec<String>> {
	let mut corrupted = Vec::new();

	for index in indexes {
		let qualified = qualify(schema, index)?;

		if let Err(err) = sqlx::query("SELECT bt_index_check($1::regclass, true)")
			.bind(&qualified)
			.execute(pool)
			.await
		{
			tracing::warn!(index = %index, error = %err, "Index failed verification.");

			corrupted.push(index.clone());
		}
	}

	Ok(corrupted)
}

fn qualify(schema: &str, name: &str) -> Result<String> {
	Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(name)?))
}

fn quote_ident(name: &str) -> Result<String> {
	if name.is_empty() || name.contains('\0') {
		return Err(Error::InvalidArgument(format!("Invalid SQL identifier {name:?}.")));
	}

	Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}
