use std::sync::{Arc, atomic::Ordering};

use super::{HashEmbedding, MemoryCollection, MemorySource, MemoryVectorStore};
use zena_domain::{EntityKind, entity::PRODUCT_TEXT_INDEX_FIELDS};
use zena_service::{Error, RebuildOutcome, RebuildRequest};

#[tokio::test]
async fn resetting_twice_yields_the_same_schema() {
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		Arc::new(MemorySource::default()),
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let collections = service.collections();

	collections.reset("products", &PRODUCT_TEXT_INDEX_FIELDS).await.expect("First reset failed.");

	let first = store.collection("products").expect("Collection must exist.");

	collections.reset("products", &PRODUCT_TEXT_INDEX_FIELDS).await.expect("Second reset failed.");

	let second = store.collection("products").expect("Collection must exist.");

	assert_eq!(first.text_indexes, second.text_indexes);
	assert_eq!(second.text_indexes, PRODUCT_TEXT_INDEX_FIELDS.map(String::from).to_vec());
}

#[tokio::test]
async fn repeated_fields_are_indexed_once() {
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		Arc::new(MemorySource::default()),
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);

	service
		.collections()
		.reset("products", &["body_parts", "product_type", "body_parts"])
		.await
		.expect("Reset failed.");

	let collection = store.collection("products").expect("Collection must exist.");

	assert_eq!(collection.text_indexes, vec!["body_parts", "product_type"]);
}

#[tokio::test]
async fn reset_replaces_previous_points() {
	let store = Arc::new(MemoryVectorStore::default());
	let source = Arc::new(MemorySource {
		records: vec![super::product(1, 1, "Массаж спины", "")],
		..Default::default()
	});
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let request = RebuildRequest { entity: EntityKind::Products, collection: None, channel_id: None };

	service.rebuild(request.clone()).await.expect("Rebuild must not error.");
	service.rebuild(request).await.expect("Rebuild must not error.");

	let collection = store.collection("products").expect("Collection must exist.");

	assert_eq!(collection.points.len(), 1);
	assert_eq!(collection.text_indexes.len(), PRODUCT_TEXT_INDEX_FIELDS.len());
}

#[tokio::test]
async fn failed_delete_stops_before_create() {
	let store = Arc::new(MemoryVectorStore { fail_deletes: true, ..Default::default() });

	store
		.collections
		.lock()
		.expect("Store lock poisoned.")
		.insert("faq".to_string(), MemoryCollection::default());

	let source = Arc::new(MemorySource {
		records: vec![super::faq(1, 1, "Абонемент на месяц")],
		..Default::default()
	});
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let reset = service.collections().reset("faq", &[]).await;
	let report = service
		.rebuild(RebuildRequest { entity: EntityKind::Faq, collection: None, channel_id: None })
		.await
		.expect("Rebuild must not error.");

	assert!(matches!(reset, Err(Error::VectorStore { .. })));
	assert_eq!(report.outcome, RebuildOutcome::CollectionFailed);
	assert_eq!(store.create_calls.load(Ordering::SeqCst), 0);
	assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 0);
	assert!(store.collection("faq").is_some());
}
