use std::sync::Arc;

use super::{HashEmbedding, MemorySource, MemoryVectorStore};
use zena_domain::EntityKind;
use zena_service::{Error, UpdateRequest, UpdateStep};

fn catalog() -> MemorySource {
	MemorySource {
		records: vec![
			super::faq(1, 1, "Абонемент на месяц"),
			super::service(100, 1, "Массаж спины"),
			super::product(10, 1, "Массаж спины классический", ""),
		],
		channels: vec![1, 2],
		candidates: vec![zena_domain::LinkCandidate {
			article: "A-10".to_string(),
			product_name: "Массаж спины".to_string(),
		}],
		..Default::default()
	}
}

fn request(entity: EntityKind, channel_id: i64, update: bool) -> UpdateRequest {
	UpdateRequest { entity, channel_id, update }
}

#[tokio::test]
async fn unconfirmed_or_unknown_channel_updates_do_nothing() {
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		Arc::new(catalog()),
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let unconfirmed = service.update(request(EntityKind::Faq, 1, false)).await;
	let unknown = service.update(request(EntityKind::Faq, 9, true)).await;

	assert!(matches!(unconfirmed, Err(Error::InvalidRequest { .. })));
	assert!(matches!(unknown, Err(Error::NotFound { .. })));
	assert!(store.collections.lock().expect("Store lock poisoned.").is_empty());
}

#[tokio::test]
async fn services_update_refreshes_links_and_products() {
	let source = Arc::new(catalog());
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source.clone(),
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let response =
		service.update(request(EntityKind::Services, 1, true)).await.expect("Update must not error.");

	assert!(response.success);
	assert_eq!(response.failed_step, None);
	assert_eq!(
		response.steps.iter().map(|timing| timing.step).collect::<Vec<_>>(),
		vec![UpdateStep::Services, UpdateStep::Links, UpdateStep::Products]
	);
	assert!(store.collection("services").is_some());
	assert!(store.collection("services_lookup").is_some());
	assert!(store.collection("products").is_some());
	assert!(store.collection("faq").is_none());
	assert_eq!(source.written.lock().expect("Source lock poisoned.").len(), 1);
}

#[tokio::test]
async fn update_stops_at_the_first_failing_step() {
	let source = Arc::new(MemorySource {
		records: vec![super::service(100, 2, "Массаж спины")],
		channels: vec![1, 2],
		..Default::default()
	});
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source.clone(),
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let response =
		service.update(request(EntityKind::Faq, 1, true)).await.expect("Update must not error.");

	assert!(!response.success);
	assert_eq!(response.failed_step, Some(UpdateStep::Faq));
	assert_eq!(response.steps.len(), 1);
	assert!(!response.steps[0].succeeded);

	let response =
		service.update(request(EntityKind::Products, 1, true)).await.expect("Update must not error.");

	// The catalog has no products at all, so the products step reports no records.
	assert_eq!(response.failed_step, Some(UpdateStep::Products));
	assert_eq!(response.steps.len(), 2);
	assert!(response.steps[0].succeeded);
}

#[tokio::test]
async fn channel_update_keeps_other_channels_indexed() {
	let source = Arc::new(MemorySource {
		records: vec![
			super::faq(1, 1, "Абонемент на месяц"),
			super::faq(2, 2, "Как оплатить картой"),
			super::faq(3, 2, "Где находится студия"),
		],
		channels: vec![1, 2],
		..Default::default()
	});
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);

	service
		.rebuild(zena_service::RebuildRequest {
			entity: EntityKind::Faq,
			collection: None,
			channel_id: None,
		})
		.await
		.expect("Rebuild must not error.");

	let response =
		service.update(request(EntityKind::Faq, 1, true)).await.expect("Update must not error.");
	let faq = store.collection("faq").expect("FAQ collection must exist.");

	assert!(response.success);
	assert_eq!(faq.points.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[tokio::test]
async fn channel_without_own_rows_still_updates_the_shared_collection() {
	let source = Arc::new(MemorySource {
		records: vec![super::faq(2, 2, "Как оплатить картой")],
		channels: vec![1, 2],
		..Default::default()
	});
	let store = Arc::new(MemoryVectorStore::default());
	let service = super::build_service(
		super::test_config(),
		source,
		store.clone(),
		Arc::new(HashEmbedding::new()),
	);
	let response =
		service.update(request(EntityKind::Faq, 1, true)).await.expect("Update must not error.");
	let faq = store.collection("faq").expect("FAQ collection must exist.");

	assert!(response.success);
	assert_eq!(response.failed_step, None);
	assert_eq!(faq.points.keys().copied().collect::<Vec<_>>(), vec![2]);
}
