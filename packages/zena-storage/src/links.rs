use crate::{Result, db::Db};
use zena_domain::{LinkCandidate, ProductServiceLink};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkWrite {
	pub deleted: u64,
	pub inserted: u64,
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
	article: String,
	product_name: String,
}

impl Db {
	pub async fn link_candidates(&self, channel_id: i64) -> Result<Vec<LinkCandidate>> {
		let rows: Vec<CandidateRow> = sqlx::query_as(
			"\
SELECT
	article::text AS article,
	COALESCE(product_full_name::text, '') AS product_name
FROM products
WHERE channel_id = $1 AND article IS NOT NULL
ORDER BY article",
		)
		.bind(channel_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|row| LinkCandidate { article: row.article, product_name: row.product_name })
			.collect())
	}

	/// Replaces the channel's product-service links in one transaction.
	///
	/// Stale links are selected through the channel's services, so links of other channels are
	/// never touched. Nothing is visible to readers until the commit.
	pub async fn replace_links(
		&self,
		channel_id: i64,
		links: &[ProductServiceLink],
	) -> Result<LinkWrite> {
		let mut tx = self.pool.begin().await?;
		let service_ids: Vec<i64> =
			sqlx::query_scalar("SELECT id::bigint FROM services WHERE channel_id = $1")
				.bind(channel_id)
				.fetch_all(&mut *tx)
				.await?;
		let deleted =
			sqlx::query("DELETE FROM products_services WHERE service_id = ANY($1::bigint[])")
				.bind(&service_ids)
				.execute(&mut *tx)
				.await?
				.rows_affected();
		let articles = links.iter().map(|link| link.article.clone()).collect::<Vec<_>>();
		let linked_services = links.iter().map(|link| link.service_id).collect::<Vec<_>>();
		let inserted = if links.is_empty() {
			0
		} else {
			sqlx::query(
				"\
INSERT INTO products_services (article_id, service_id)
SELECT * FROM UNNEST($1::text[], $2::bigint[])",
			)
			.bind(&articles)
			.bind(&linked_services)
			.execute(&mut *tx)
			.await?
			.rows_affected()
		};

		tx.commit().await?;

		tracing::debug!(
			channel_id,
			deleted,
			inserted,
			services = service_ids.len(),
			"Product links replaced."
		);

		Ok(LinkWrite { deleted, inserted })
	}
}
