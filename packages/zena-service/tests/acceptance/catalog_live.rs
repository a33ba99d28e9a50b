use std::sync::Arc;

use super::HashEmbedding;
use zena_domain::EntityKind;
use zena_service::{LinkRebuildRequest, Providers, RebuildRequest, ZenaService};
use zena_storage::{db::Db, qdrant::QdrantStore};
use zena_testkit::TestDatabase;

const SEED: &str = "\
INSERT INTO channel_chattype (channel_id) VALUES (1);
INSERT INTO faq (id, channel_id, topic, question, answer) VALUES
	(1, 1, 'Оплата', 'Как оплатить занятия картой?', 'Картой на ресепшене'),
	(2, 1, 'Абонементы', 'Абонемент на месяц можно заморозить?', 'Да, на две недели'),
	(3, 1, NULL, 'Где находится студия?', 'На Тверской');
INSERT INTO services (id, channel_id, services_name) VALUES (100, 1, 'Массаж спины');
INSERT INTO products (id, channel_id, article, product_full_name) VALUES (10, 1, 'A-10', 'Массаж спины')";

async fn live_service() -> Option<(TestDatabase, ZenaService)> {
	let Some(base_dsn) = zena_testkit::env_dsn() else {
		eprintln!("Skipping live catalog test; set ZENA_PG_DSN to run this test.");

		return None;
	};
	let Some(qdrant_url) = zena_testkit::env_qdrant_url() else {
		eprintln!("Skipping live catalog test; set ZENA_QDRANT_URL to run this test.");

		return None;
	};
	let test_db =
		TestDatabase::with_catalog(&base_dsn).await.expect("Failed to create test database.");
	let mut cfg = super::test_config();

	cfg.storage.postgres.dsn = test_db.dsn().to_string();
	cfg.storage.qdrant.url = qdrant_url;
	cfg.storage.qdrant.collections.faq = test_db.collection_name("faq");
	cfg.storage.qdrant.collections.services = test_db.collection_name("services");
	cfg.storage.qdrant.collections.products = test_db.collection_name("products");
	cfg.storage.qdrant.collections.services_lookup = test_db.collection_name("services_lookup");

	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	sqlx::raw_sql(SEED).execute(&db.pool).await.expect("Failed to seed catalog.");

	let qdrant = QdrantStore::new(&cfg.storage.qdrant).expect("Failed to build Qdrant client.");
	let providers = Providers::new(Arc::new(HashEmbedding::new()), Arc::new(super::bm25()));
	let service = ZenaService::with_parts(cfg, Arc::new(db), Arc::new(qdrant), providers);

	Some((test_db, service))
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set ZENA_PG_DSN and ZENA_QDRANT_URL to run."]
async fn faq_rebuild_is_searchable_in_qdrant() {
	let Some((test_db, service)) = live_service().await else {
		return;
	};
	let report = service
		.rebuild(RebuildRequest { entity: EntityKind::Faq, collection: None, channel_id: Some(1) })
		.await
		.expect("Rebuild must not error.");

	assert!(report.succeeded(), "Rebuild report: {report:?}");

	let collection = service.collection_for(EntityKind::Faq).to_string();
	let results = service
		.hybrid_search(&collection, EntityKind::Faq, Some("Абонемент"), None, 12)
		.await
		.expect("Search must succeed.");

	assert!(results.iter().any(|result| result.id == 2 && result.score.is_some()));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set ZENA_PG_DSN and ZENA_QDRANT_URL to run."]
async fn links_are_written_for_the_channel() {
	let Some((test_db, service)) = live_service().await else {
		return;
	};
	let report = service
		.rebuild_links(LinkRebuildRequest::new(1))
		.await
		.expect("Link rebuild must not error.");

	assert!(report.succeeded, "Link report: {report:?}");
	assert_eq!(report.lookup_refreshed, Some(true));
	assert_eq!(report.inserted, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
