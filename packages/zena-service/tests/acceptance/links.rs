use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use super::{GatedEmbedding, HashEmbedding, MemorySource, MemoryVectorStore};
use zena_domain::{LinkCandidate, ProductServiceLink};
use zena_service::{Error, LinkRebuildRequest};

fn candidate(article: &str, product_name: &str) -> LinkCandidate {
	LinkCandidate { article: article.to_string(), product_name: product_name.to_string() }
}

fn catalog() -> MemorySource {
	MemorySource {
		records: vec![
			super::service(100, 1, "Массаж спины"),
			super::service(200, 1, "Пилинг лица"),
			super::service(300, 2, "Массаж спины и шеи"),
		],
		channels: vec![1, 2],
		..Default::default()
	}
}

#[tokio::test(start_paused = true)]
async fn lookups_never_exceed_the_parallel_limit() {
	let candidates =
		(0..10).map(|i| candidate(&format!("A-{i}"), &format!("Массаж спины {i}"))).collect();
	let source = Arc::new(MemorySource { candidates, ..catalog() });
	let store = Arc::new(MemoryVectorStore::default());
	let embedding = Arc::new(GatedEmbedding {
		in_flight: AtomicUsize::new(0),
		peak: AtomicUsize::new(0),
		delay: Duration::from_millis(50),
	});
	let service =
		super::build_service(super::test_config(), source.clone(), store.clone(), embedding.clone());
	let mut request = LinkRebuildRequest::new(1);

	request.max_parallel = Some(2);

	let report = service.rebuild_links(request).await.expect("Link rebuild must not error.");

	assert!(report.succeeded);
	assert_eq!(report.lookup_refreshed, Some(true));
	assert_eq!(report.candidates, 10);
	assert_eq!(report.matched, 10);
	assert_eq!(embedding.peak.load(Ordering::SeqCst), 2);
	assert_eq!(embedding.in_flight.load(Ordering::SeqCst), 0);

	let lookup = store.collection("services_lookup").expect("Lookup collection must exist.");

	assert_eq!(lookup.points.keys().copied().collect::<Vec<_>>(), vec![100, 200]);
}

#[tokio::test]
async fn matched_pairs_are_written_once_per_channel() {
	let source = Arc::new(MemorySource {
		candidates: vec![
			candidate("A-1", "Массаж спины"),
			candidate("A-1", "Массаж спины"),
			candidate("B-1", "Пилинг лица"),
			candidate("C-1", "  "),
		],
		..catalog()
	});
	let service = super::build_service(
		super::test_config(),
		source.clone(),
		Arc::new(MemoryVectorStore::default()),
		Arc::new(HashEmbedding::new()),
	);
	let report =
		service.rebuild_links(LinkRebuildRequest::new(1)).await.expect("Link rebuild must not error.");
	let written = source.written.lock().expect("Source lock poisoned.").clone();

	assert!(report.succeeded);
	assert_eq!(report.unmatched, 1);
	assert_eq!(report.inserted, 2);
	assert_eq!(
		written,
		vec![(
			1,
			vec![
				ProductServiceLink { article: "A-1".to_string(), service_id: 100 },
				ProductServiceLink { article: "B-1".to_string(), service_id: 200 },
			]
		)]
	);
}

#[tokio::test]
async fn missing_lookup_collection_only_drops_matches() {
	let source = Arc::new(MemorySource {
		candidates: vec![candidate("A-1", "Массаж спины")],
		..catalog()
	});
	let service = super::build_service(
		super::test_config(),
		source.clone(),
		Arc::new(MemoryVectorStore::default()),
		Arc::new(HashEmbedding::new()),
	);
	let mut request = LinkRebuildRequest::new(1);

	request.refresh_lookup = false;

	let report = service.rebuild_links(request).await.expect("Link rebuild must not error.");

	assert!(report.succeeded);
	assert_eq!(report.lookup_refreshed, None);
	assert_eq!(report.failed_lookups, 1);
	assert_eq!(report.matched, 0);
	assert_eq!(source.written.lock().expect("Source lock poisoned.").len(), 1);
}

#[tokio::test]
async fn invalid_channel_is_rejected() {
	let service = super::build_service(
		super::test_config(),
		Arc::new(catalog()),
		Arc::new(MemoryVectorStore::default()),
		Arc::new(HashEmbedding::new()),
	);
	let result = service.rebuild_links(LinkRebuildRequest::new(0)).await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
}
