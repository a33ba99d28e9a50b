use std::sync::Arc;

use super::{HashEmbedding, MemorySource, MemoryVectorStore};
use zena_domain::{EntityKind, ResultItem};
use zena_service::{
	Error, FilterCriteria, RebuildRequest, SearchMode, SearchRequest, ZenaService,
};

async fn indexed_products() -> ZenaService {
	let source = Arc::new(MemorySource {
		records: vec![
			super::product(1, 1, "Массаж спины классический", "тромбоз, варикоз"),
			super::product(2, 1, "Массаж спины лечебный", "беременность"),
			super::product(3, 1, "Массаж шеи", ""),
			super::product(4, 2, "Массаж спины спортивный", ""),
		],
		..Default::default()
	});
	let service = super::build_service(
		super::test_config(),
		source,
		Arc::new(MemoryVectorStore::default()),
		Arc::new(HashEmbedding::new()),
	);
	let report = service
		.rebuild(RebuildRequest { entity: EntityKind::Products, collection: None, channel_id: None })
		.await
		.expect("Rebuild must not error.");

	assert!(report.succeeded());

	service
}

fn search(query: Option<&str>, filter: FilterCriteria, mode: SearchMode) -> SearchRequest {
	SearchRequest {
		entity: EntityKind::Products,
		collection: None,
		query: query.map(str::to_string),
		filter,
		mode,
		limit: None,
	}
}

fn product_ids(items: &[zena_domain::QueryResult]) -> Vec<String> {
	items
		.iter()
		.filter_map(|result| match &result.item {
			ResultItem::Product(product) => product.product_id.clone(),
			_ => None,
		})
		.collect()
}

#[tokio::test]
async fn contraindicated_products_are_excluded() {
	let service = indexed_products().await;
	let criteria = FilterCriteria {
		channel_id: Some(1),
		contraindications: vec!["Тромбоз".to_string()],
		..Default::default()
	};

	for mode in [SearchMode::Hybrid, SearchMode::Dense] {
		let response = service
			.search(search(Some("массаж спины"), criteria.clone(), mode))
			.await
			.expect("Search must succeed.");
		let ids = product_ids(&response.items);

		assert!(!ids.is_empty());
		assert!(!ids.contains(&"A-1".to_string()), "{mode:?} returned a contraindicated product.");
		assert!(!ids.contains(&"A-4".to_string()), "{mode:?} crossed the channel boundary.");
	}
}

#[tokio::test]
async fn empty_query_lists_points_under_the_filter() {
	let service = indexed_products().await;
	let criteria = FilterCriteria {
		channel_id: Some(1),
		body_parts: vec!["спина".to_string()],
		..Default::default()
	};
	let response = service
		.search(search(Some("   "), criteria, SearchMode::Hybrid))
		.await
		.expect("Search must succeed.");

	assert_eq!(response.collection, "products");
	assert_eq!(product_ids(&response.items), vec!["A-1", "A-2", "A-3"]);
	assert!(response.items.iter().all(|result| result.score.is_none()));

	let ResultItem::Product(product) = &response.items[0].item else {
		panic!("Expected a product item.");
	};

	assert_eq!(product.price.as_deref(), Some("2000 - 2500 руб."));
}

#[tokio::test]
async fn conflicting_criteria_fail_before_any_query() {
	let service = indexed_products().await;
	let criteria = FilterCriteria {
		indications: vec!["отёки".to_string()],
		contraindications: vec!["Отёки".to_string()],
		..Default::default()
	};
	let result = service.search(search(Some("массаж"), criteria, SearchMode::Hybrid)).await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
}
