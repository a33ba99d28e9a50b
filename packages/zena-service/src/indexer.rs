//! Full collection rebuilds from the relational source.
//!
//! A rebuild loads every row of one entity, recreates the target collection, embeds the rows in
//! sequential batches, and finishes with a hybrid self-check query. Batches that were upserted
//! before a failure stay in the collection.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{Error, FilterCriteria, Result, ZenaService, build_filter};
use zena_domain::{EntityKind, Point, SourceRecord};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RebuildRequest {
	pub entity: EntityKind,
	/// Overrides the configured collection of `entity`.
	#[serde(default)]
	pub collection: Option<String>,
	#[serde(default)]
	pub channel_id: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildOutcome {
	Ready,
	NoRecords,
	SourceUnavailable,
	CollectionFailed,
	UpsertFailed,
	SelfCheckEmpty,
	SelfCheckFailed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RebuildReport {
	pub entity: EntityKind,
	pub collection: String,
	pub channel_id: Option<i64>,
	pub outcome: RebuildOutcome,
	pub loaded: usize,
	pub indexed: usize,
	pub skipped_blank: usize,
	pub skipped_invalid_id: usize,
	pub batches_committed: usize,
	pub batches_skipped: usize,
	pub self_check_hits: usize,
	pub elapsed_ms: u64,
}
impl RebuildReport {
	fn new(entity: EntityKind, collection: &str, channel_id: Option<i64>) -> Self {
		Self {
			entity,
			collection: collection.to_string(),
			channel_id,
			outcome: RebuildOutcome::Ready,
			loaded: 0,
			indexed: 0,
			skipped_blank: 0,
			skipped_invalid_id: 0,
			batches_committed: 0,
			batches_skipped: 0,
			self_check_hits: 0,
			elapsed_ms: 0,
		}
	}

	/// Only a rebuild whose self-check found at least one point counts as a success.
	pub fn succeeded(&self) -> bool {
		self.outcome == RebuildOutcome::Ready
	}

	fn finish(mut self, outcome: RebuildOutcome, started: Instant) -> Self {
		self.outcome = outcome;
		self.elapsed_ms = started.elapsed().as_millis() as u64;

		self
	}
}

impl ZenaService {
	pub async fn rebuild(&self, req: RebuildRequest) -> Result<RebuildReport> {
		let collection =
			req.collection.clone().unwrap_or_else(|| self.collection_for(req.entity).to_string());

		self.rebuild_collection(
			req.entity,
			&collection,
			req.entity.text_index_fields(),
			req.channel_id,
		)
		.await
	}

	/// Rebuilds `collection` from the rows of `entity`, optionally scoped to one channel.
	///
	/// Source, collection, upsert and self-check failures are reported through the outcome.
	/// Embedding failures that survive the retry policy are returned as errors.
	pub async fn rebuild_collection(
		&self,
		entity: EntityKind,
		collection: &str,
		text_index_fields: &[&str],
		channel_id: Option<i64>,
	) -> Result<RebuildReport> {
		if let Some(channel_id) = channel_id.filter(|channel_id| *channel_id <= 0) {
			return Err(Error::InvalidRequest {
				message: format!("channel_id must be positive, got {channel_id}."),
			});
		}

		let _guard = self.lock_collection(collection).await;
		let started = Instant::now();
		let mut report = RebuildReport::new(entity, collection, channel_id);

		tracing::info!(%entity, collection, channel_id, "Collection rebuild started.");

		let records = match self.source.load_records(entity, channel_id).await {
			Ok(records) => records,
			Err(err) => {
				tracing::error!(%entity, collection, error = %err, "Failed to load source records.");

				return Ok(report.finish(RebuildOutcome::SourceUnavailable, started));
			},
		};

		report.loaded = records.len();

		if records.is_empty() {
			tracing::warn!(%entity, collection, channel_id, "No source records. Collection left untouched.");

			return Ok(report.finish(RebuildOutcome::NoRecords, started));
		}
		if let Err(err) = self.collections().reset(collection, text_index_fields).await {
			tracing::error!(collection, error = %err, "Failed to reset collection.");

			return Ok(report.finish(RebuildOutcome::CollectionFailed, started));
		}

		let batch_size = self.cfg.indexing.batch_size.max(1);

		for (batch, chunk) in records.chunks(batch_size).enumerate() {
			let points = self.embed_chunk(chunk, &mut report).await?;

			if points.is_empty() {
				tracing::info!(collection, batch, "Batch has no indexable records. Skipping.");

				report.batches_skipped += 1;

				continue;
			}

			let count = points.len();

			if let Err(err) = self
				.retry
				.execute("upsert_points", || self.vectors.upsert_points(collection, points.clone()))
				.await
			{
				tracing::error!(collection, batch, error = %err, "Batch upsert failed. Aborting rebuild.");

				return Ok(report.finish(RebuildOutcome::UpsertFailed, started));
			}

			report.indexed += count;
			report.batches_committed += 1;

			tracing::info!(collection, batch, points = count, "Batch upserted.");
		}

		let outcome = self.self_check(entity, collection, channel_id, &mut report).await;
		let report = report.finish(outcome, started);

		tracing::info!(
			%entity,
			collection,
			outcome = ?report.outcome,
			indexed = report.indexed,
			elapsed_ms = report.elapsed_ms,
			"Collection rebuild finished."
		);

		Ok(report)
	}

	async fn embed_chunk(
		&self,
		chunk: &[SourceRecord],
		report: &mut RebuildReport,
	) -> Result<Vec<Point>> {
		let mut kept = Vec::with_capacity(chunk.len());

		for record in chunk {
			if !record.has_primary_text() {
				report.skipped_blank += 1;

				continue;
			}

			match u64::try_from(record.id()) {
				Ok(id) => kept.push((id, record)),
				Err(_) => {
					tracing::warn!(id = record.id(), "Record id cannot be a point id. Skipping.");

					report.skipped_invalid_id += 1;
				},
			}
		}

		if kept.is_empty() {
			return Ok(Vec::new());
		}

		let texts =
			kept.iter().map(|(_, record)| record.primary_text().to_string()).collect::<Vec<_>>();
		let embedded = self.embeddings().embed_batch(&texts).await?;

		if embedded.len() != kept.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedded {} vectors for {} records.",
					embedded.len(),
					kept.len()
				),
			});
		}

		Ok(kept
			.into_iter()
			.zip(embedded.dense)
			.zip(embedded.sparse)
			.map(|(((id, record), dense), sparse)| Point {
				id,
				dense,
				sparse,
				payload: record.to_payload(),
			})
			.collect())
	}

	async fn self_check(
		&self,
		entity: EntityKind,
		collection: &str,
		channel_id: Option<i64>,
		report: &mut RebuildReport,
	) -> RebuildOutcome {
		let probe = self.probe_text(entity);
		let criteria = channel_id.map(FilterCriteria::channel).unwrap_or_default();
		let result = match build_filter(&criteria) {
			Ok(filter) =>
				self.hybrid_search(
					collection,
					entity,
					Some(probe),
					filter.as_ref(),
					self.cfg.search.hybrid_limit,
				)
				.await,
			Err(err) => Err(err),
		};

		match result {
			Ok(items) if items.is_empty() => {
				tracing::warn!(collection, probe, "Self-check query returned nothing.");

				RebuildOutcome::SelfCheckEmpty
			},
			Ok(items) => {
				report.self_check_hits = items.len();

				RebuildOutcome::Ready
			},
			Err(err) => {
				tracing::error!(collection, probe, error = %err, "Self-check query failed.");

				RebuildOutcome::SelfCheckFailed
			},
		}
	}

	fn probe_text(&self, entity: EntityKind) -> &str {
		let indexing = &self.cfg.indexing;

		match entity {
			EntityKind::Faq => &indexing.probe_faq,
			EntityKind::Services => &indexing.probe_services,
			EntityKind::Products => &indexing.probe_products,
		}
	}
}
