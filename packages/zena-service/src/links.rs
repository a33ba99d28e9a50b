//! Product to service association rebuild.
//!
//! Each product of a channel is matched to its closest service by one dense lookup against the
//! services lookup collection. The surviving pairs replace the channel's links in one
//! transaction, after a B-tree integrity pass over the products table.

use std::{collections::BTreeSet, time::Instant};

use futures::future;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::{Error, FilterCriteria, Result, ZenaService, build_filter};
use zena_domain::{EntityKind, LinkCandidate, ProductServiceLink, SearchFilter};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkRebuildRequest {
	pub channel_id: i64,
	/// Lookups in flight at once. Defaults to `indexing.max_parallel`.
	#[serde(default)]
	pub max_parallel: Option<usize>,
	/// Rebuild the services lookup collection for the channel before matching.
	#[serde(default = "default_refresh_lookup")]
	pub refresh_lookup: bool,
}
impl LinkRebuildRequest {
	pub fn new(channel_id: i64) -> Self {
		Self { channel_id, max_parallel: None, refresh_lookup: true }
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LinkReport {
	pub channel_id: i64,
	pub succeeded: bool,
	pub lookup_refreshed: Option<bool>,
	pub indexes_checked: usize,
	pub indexes_corrupted: usize,
	pub indexes_reindexed: usize,
	pub candidates: usize,
	pub matched: usize,
	pub unmatched: usize,
	pub failed_lookups: usize,
	pub deleted: u64,
	pub inserted: u64,
	pub elapsed_ms: u64,
}

enum LookupOutcome {
	Matched(ProductServiceLink),
	Unmatched,
	Failed,
}

impl ZenaService {
	/// Recomputes the product-service links of one channel.
	///
	/// Lookup failures only drop the affected product. Storage failures while loading candidates
	/// or writing links leave the previous links in place and mark the report as failed.
	pub async fn rebuild_links(&self, req: LinkRebuildRequest) -> Result<LinkReport> {
		let channel_id = req.channel_id;
		let max_parallel = req.max_parallel.unwrap_or(self.cfg.indexing.max_parallel);

		if max_parallel == 0 {
			return Err(Error::InvalidRequest {
				message: "max_parallel must be greater than zero.".to_string(),
			});
		}

		let filter = build_filter(&FilterCriteria::channel(channel_id))?;
		let started = Instant::now();
		let lookup_collection = self.cfg.storage.qdrant.collections.services_lookup.clone();
		let mut report = LinkReport { channel_id, ..Default::default() };

		if req.refresh_lookup {
			report.lookup_refreshed =
				Some(self.refresh_lookup_collection(&lookup_collection, channel_id).await);
		}

		match self.source.repair_link_indexes().await {
			Ok(integrity) => {
				report.indexes_checked = integrity.checked.len();
				report.indexes_corrupted = integrity.corrupted.len();
				report.indexes_reindexed = integrity.reindexed.len();

				if !integrity.still_corrupted.is_empty() {
					tracing::error!(
						indexes = ?integrity.still_corrupted,
						"Indexes remain corrupted after repair."
					);
				}
			},
			Err(err) => {
				tracing::warn!(error = %err, "Index integrity pass failed. Continuing.");
			},
		}

		let candidates = match self.source.link_candidates(channel_id).await {
			Ok(candidates) => candidates,
			Err(err) => {
				tracing::error!(channel_id, error = %err, "Failed to load link candidates.");

				report.elapsed_ms = started.elapsed().as_millis() as u64;

				return Ok(report);
			},
		};

		report.candidates = candidates.len();

		let links = self
			.lookup_links(&lookup_collection, &candidates, filter.as_ref(), max_parallel, &mut report)
			.await;

		report.matched = links.len();

		match self.source.replace_links(channel_id, &links).await {
			Ok(write) => {
				report.deleted = write.deleted;
				report.inserted = write.inserted;
				report.succeeded = true;

				tracing::info!(
					channel_id,
					deleted = write.deleted,
					inserted = write.inserted,
					"Product-service links replaced."
				);
			},
			Err(err) => {
				tracing::error!(channel_id, error = %err, "Failed to replace links. Rolled back.");
			},
		}

		report.elapsed_ms = started.elapsed().as_millis() as u64;

		Ok(report)
	}

	async fn refresh_lookup_collection(&self, collection: &str, channel_id: i64) -> bool {
		match self.rebuild_collection(EntityKind::Services, collection, &[], Some(channel_id)).await
		{
			Ok(report) if report.succeeded() => true,
			Ok(report) => {
				tracing::error!(
					collection,
					outcome = ?report.outcome,
					"Lookup collection rebuild did not succeed. Matching against its current state."
				);

				false
			},
			Err(err) => {
				tracing::error!(
					collection,
					error = %err,
					"Lookup collection rebuild failed. Matching against its current state."
				);

				false
			},
		}
	}

	/// Runs one lookup per candidate with at most `max_parallel` in flight.
	async fn lookup_links(
		&self,
		collection: &str,
		candidates: &[LinkCandidate],
		filter: Option<&SearchFilter>,
		max_parallel: usize,
		report: &mut LinkReport,
	) -> Vec<ProductServiceLink> {
		let semaphore = Semaphore::new(max_parallel);
		let lookups = candidates.iter().map(|candidate| {
			let semaphore = &semaphore;

			async move {
				let Ok(_permit) = semaphore.acquire().await else {
					return LookupOutcome::Failed;
				};

				self.lookup_service(collection, candidate, filter).await
			}
		});
		let mut links = BTreeSet::new();

		for outcome in future::join_all(lookups).await {
			match outcome {
				LookupOutcome::Matched(link) => {
					links.insert(link);
				},
				LookupOutcome::Unmatched => report.unmatched += 1,
				LookupOutcome::Failed => report.failed_lookups += 1,
			}
		}

		links.into_iter().collect()
	}

	async fn lookup_service(
		&self,
		collection: &str,
		candidate: &LinkCandidate,
		filter: Option<&SearchFilter>,
	) -> LookupOutcome {
		if candidate.product_name.trim().is_empty() {
			return LookupOutcome::Unmatched;
		}

		let hits = match self
			.dense_search(collection, EntityKind::Services, Some(&candidate.product_name), filter, 1)
			.await
		{
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(
					article = %candidate.article,
					error = %err,
					"Service lookup failed. Skipping product."
				);

				return LookupOutcome::Failed;
			},
		};
		let Some(service_id) = hits.first().and_then(|hit| i64::try_from(hit.id).ok()) else {
			return LookupOutcome::Unmatched;
		};

		LookupOutcome::Matched(ProductServiceLink { article: candidate.article.clone(), service_id })
	}
}

fn default_refresh_lookup() -> bool {
	true
}
