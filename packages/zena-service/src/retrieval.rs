use serde::{Deserialize, Serialize};

use crate::{FilterCriteria, Result, ZenaService, build_filter, fusion};
use zena_domain::{EntityKind, QueryResult, QueryVector, SearchFilter, SearchHit};

const FUSION_SERVER: &str = "server";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	Dense,
	#[default]
	Hybrid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
	pub entity: EntityKind,
	/// Overrides the configured collection of `entity`.
	#[serde(default)]
	pub collection: Option<String>,
	#[serde(default)]
	pub query: Option<String>,
	#[serde(default)]
	pub filter: FilterCriteria,
	#[serde(default)]
	pub mode: SearchMode,
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub collection: String,
	pub items: Vec<QueryResult>,
}

impl ZenaService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let collection =
			req.collection.clone().unwrap_or_else(|| self.collection_for(req.entity).to_string());
		let filter = build_filter(&req.filter)?;
		let query = req.query.as_deref();
		let items = match req.mode {
			SearchMode::Dense => {
				let limit = req.limit.unwrap_or(self.cfg.search.dense_limit);

				self.dense_search(&collection, req.entity, query, filter.as_ref(), limit).await?
			},
			SearchMode::Hybrid => {
				let limit = req.limit.unwrap_or(self.cfg.search.hybrid_limit);

				self.hybrid_search(&collection, req.entity, query, filter.as_ref(), limit).await?
			},
		};

		Ok(SearchResponse { collection, items })
	}

	/// Nearest neighbours in the dense space, or an unranked listing without a query.
	pub async fn dense_search(
		&self,
		collection: &str,
		entity: EntityKind,
		query: Option<&str>,
		filter: Option<&SearchFilter>,
		limit: u32,
	) -> Result<Vec<QueryResult>> {
		let Some(query) = non_blank(query) else {
			return self.scroll_results(collection, entity, filter, limit).await;
		};
		let dense = self.embeddings().dense_query(query).await?;
		let hits = self
			.retry
			.execute("query_nearest", || {
				self.vectors.query_nearest(
					collection,
					QueryVector::Dense(dense.clone()),
					filter,
					limit as u64,
				)
			})
			.await?;

		tracing::debug!(collection, hits = hits.len(), "Dense search finished.");

		Ok(normalize(entity, &hits))
	}

	/// Dense and sparse candidates fused by Reciprocal Rank Fusion.
	///
	/// Fusion runs in-process unless `search.fusion` selects the vector store's fused query.
	pub async fn hybrid_search(
		&self,
		collection: &str,
		entity: EntityKind,
		query: Option<&str>,
		filter: Option<&SearchFilter>,
		limit: u32,
	) -> Result<Vec<QueryResult>> {
		let Some(query) = non_blank(query) else {
			return self.scroll_results(collection, entity, filter, limit).await;
		};
		let embeddings = self.embeddings();
		let dense = embeddings.dense_query(query).await?;
		let sparse = embeddings.sparse_query(query).await?;
		let prefetch_limit = self.cfg.search.prefetch_limit as u64;
		let hits = if self.cfg.search.fusion == FUSION_SERVER {
			self.retry
				.execute("query_fused", || {
					self.vectors.query_fused(
						collection,
						vec![QueryVector::Dense(dense.clone()), QueryVector::Sparse(sparse.clone())],
						filter,
						prefetch_limit,
						limit as u64,
					)
				})
				.await?
		} else {
			let dense_hits = self.retry.execute("query_dense_prefetch", || {
				self.vectors.query_nearest(
					collection,
					QueryVector::Dense(dense.clone()),
					filter,
					prefetch_limit,
				)
			});
			let sparse_hits = self.retry.execute("query_sparse_prefetch", || {
				self.vectors.query_nearest(
					collection,
					QueryVector::Sparse(sparse.clone()),
					filter,
					prefetch_limit,
				)
			});
			let (dense_hits, sparse_hits) = tokio::try_join!(dense_hits, sparse_hits)?;

			fusion::reciprocal_rank_fusion(
				&[dense_hits, sparse_hits],
				self.cfg.search.rrf_k,
				limit as usize,
			)
		};

		tracing::debug!(collection, hits = hits.len(), "Hybrid search finished.");

		Ok(normalize(entity, &hits))
	}

	async fn scroll_results(
		&self,
		collection: &str,
		entity: EntityKind,
		filter: Option<&SearchFilter>,
		limit: u32,
	) -> Result<Vec<QueryResult>> {
		let hits =
			self.retry.execute("scroll", || self.vectors.scroll(collection, filter, limit)).await?;

		Ok(normalize(entity, &hits))
	}
}

fn non_blank(query: Option<&str>) -> Option<&str> {
	query.map(str::trim).filter(|query| !query.is_empty())
}

fn normalize(entity: EntityKind, hits: &[SearchHit]) -> Vec<QueryResult> {
	hits.iter().map(|hit| QueryResult::from_hit(entity, hit)).collect()
}
