use std::sync::{Arc, atomic::Ordering};

use super::{HashEmbedding, MemorySource, MemoryVectorStore};
use zena_domain::{EntityKind, ResultItem, SourceRecord};
use zena_service::{RebuildOutcome, RebuildRequest};

fn faq_rows() -> Vec<SourceRecord> {
	vec![
		super::faq(1, 1, "Как оплатить занятия картой?"),
		super::faq(2, 1, "Абонемент на месяц можно заморозить?"),
		super::faq(3, 1, "Где находится студия?"),
	]
}

fn rebuild_faq(channel_id: Option<i64>) -> RebuildRequest {
	RebuildRequest { entity: EntityKind::Faq, collection: None, channel_id }
}

#[tokio::test]
async fn rebuilt_faq_answers_the_probe_query() {
	let source = Arc::new(MemorySource { records: faq_rows(), ..Default::default() });
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let report = service.rebuild(rebuild_faq(None)).await.expect("Rebuild must not error.");

	assert_eq!(report.outcome, RebuildOutcome::Ready);
	assert!(report.succeeded());
	assert_eq!(report.indexed, 3);
	assert_eq!(report.batches_committed, 2);

	let results = service
		.hybrid_search("faq", EntityKind::Faq, Some("Абонемент"), None, 12)
		.await
		.expect("Search must succeed.");
	let hit = results.iter().find(|result| result.id == 2).expect("Row 2 must be returned.");

	assert!(results.len() <= 12);
	assert!(hit.score.is_some());
	assert_eq!(results[0].id, 2);

	let ResultItem::Faq(item) = &hit.item else {
		panic!("Expected a FAQ item.");
	};

	assert_eq!(item.question.as_deref(), Some("Абонемент на месяц можно заморозить?"));
}

#[tokio::test]
async fn blank_primary_text_never_becomes_a_point() {
	let mut records = faq_rows();

	records.push(super::faq(4, 1, "   "));
	records.push(super::faq(5, 1, "\n"));
	records.push(super::faq(6, 1, ""));

	let source = Arc::new(MemorySource { records, ..Default::default() });
	let store = Arc::new(MemoryVectorStore::default());
	let embedding = Arc::new(HashEmbedding::new());
	let service =
		super::build_service(super::test_config(), source, store.clone(), embedding.clone());
	let report = service.rebuild(rebuild_faq(None)).await.expect("Rebuild must not error.");
	let collection = store.collection("faq").expect("Collection must exist.");

	assert_eq!(report.loaded, 6);
	assert_eq!(report.skipped_blank, 3);
	assert_eq!(report.indexed, 3);
	assert_eq!(collection.points.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
	// Rows 5 and 6 form a batch of blanks that never reaches the provider.
	assert_eq!(report.batches_skipped, 1);
	// Two committed batches plus the self-check query.
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn batches_keep_records_and_vectors_aligned() {
	let records = vec![
		super::faq(10, 1, "Первый вопрос"),
		super::faq(11, 1, " "),
		super::faq(12, 1, "Третий\nвопрос"),
		super::faq(13, 1, "Четвёртый вопрос о массаже"),
		super::faq(14, 1, "Пятый"),
	];
	let source = Arc::new(MemorySource { records: records.clone(), ..Default::default() });
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);

	service.rebuild(rebuild_faq(None)).await.expect("Rebuild must not error.");

	let collection = store.collection("faq").expect("Collection must exist.");
	let bm25 = super::bm25();

	assert_eq!(collection.points.len(), 4);

	for record in records.iter().filter(|record| record.has_primary_text()) {
		let point = &collection.points[&(record.id() as u64)];

		assert_eq!(point.payload["question"], record.primary_text());
		assert_eq!(point.dense, super::embed_text(record.primary_text()));
		assert_eq!(point.sparse, bm25.embed_passage(record.primary_text()));
	}
}

#[tokio::test]
async fn missing_source_leaves_the_store_untouched() {
	let source = Arc::new(MemorySource { unavailable: true, ..Default::default() });
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let report = service.rebuild(rebuild_faq(None)).await.expect("Rebuild must not error.");

	assert_eq!(report.outcome, RebuildOutcome::SourceUnavailable);
	assert!(!report.succeeded());
	assert!(store.collection("faq").is_none());

	let empty = super::build_service(
		super::test_config(),
		Arc::new(MemorySource::default()),
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let report = empty.rebuild(rebuild_faq(Some(1))).await.expect("Rebuild must not error.");

	assert_eq!(report.outcome, RebuildOutcome::NoRecords);
	assert!(store.collection("faq").is_none());
}

#[tokio::test]
async fn upsert_exhaustion_keeps_earlier_batches() {
	let source = Arc::new(MemorySource { records: faq_rows(), ..Default::default() });
	let store = Arc::new(MemoryVectorStore { fail_upserts_from: Some(1), ..Default::default() });
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let report = service.rebuild(rebuild_faq(None)).await.expect("Rebuild must not error.");
	let collection = store.collection("faq").expect("Collection must exist.");

	assert_eq!(report.outcome, RebuildOutcome::UpsertFailed);
	assert_eq!(report.batches_committed, 1);
	assert_eq!(collection.points.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
	// One successful upsert and three attempts at the second batch.
	assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn channel_scoped_rebuild_only_indexes_that_channel() {
	let mut records = faq_rows();

	records.push(super::faq(7, 2, "Абонемент для другого канала"));

	let source = Arc::new(MemorySource { records, ..Default::default() });
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let report = service.rebuild(rebuild_faq(Some(2))).await.expect("Rebuild must not error.");
	let collection = store.collection("faq").expect("Collection must exist.");

	assert!(report.succeeded());
	assert_eq!(report.self_check_hits, 1);
	assert_eq!(collection.points.keys().copied().collect::<Vec<_>>(), vec![7]);
}
