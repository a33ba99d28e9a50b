use crate::{Result, db::Db};
use zena_domain::{EntityKind, FaqRecord, ProductRecord, ServiceRecord, SourceRecord};

#[derive(sqlx::FromRow)]
struct FaqRow {
	id: i64,
	channel_id: i64,
	topic: Option<String>,
	question: String,
	answer: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
	id: i64,
	channel_id: i64,
	services_name: String,
	description: Option<String>,
	indications: Option<String>,
	contraindications: Option<String>,
	pre_session_instructions: Option<String>,
	body_parts: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
	id: i64,
	channel_id: i64,
	product_search: String,
	product_id: Option<String>,
	product_name: Option<String>,
	product_type: Option<String>,
	body_parts: Option<String>,
	indications_key: Option<String>,
	contraindications_key: Option<String>,
	duration: Option<String>,
	price_min: Option<f64>,
	price_max: Option<f64>,
}

impl Db {
	/// Loads a snapshot of one entity's rows in id order, optionally scoped to a channel.
	pub async fn load_records(
		&self,
		kind: EntityKind,
		channel_id: Option<i64>,
	) -> Result<Vec<SourceRecord>> {
		match kind {
			EntityKind::Faq => self.load_faq(channel_id).await,
			EntityKind::Services => self.load_services(channel_id).await,
			EntityKind::Products => self.load_products(channel_id).await,
		}
	}

	pub async fn channel_exists(&self, channel_id: i64) -> Result<bool> {
		let exists: bool = sqlx::query_scalar(
			"SELECT EXISTS (SELECT 1 FROM channel_chattype cc WHERE cc.channel_id = $1)",
		)
		.bind(channel_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(exists)
	}

	async fn load_faq(&self, channel_id: Option<i64>) -> Result<Vec<SourceRecord>> {
		let rows: Vec<FaqRow> = sqlx::query_as(
			"\
SELECT
	id::bigint AS id,
	channel_id::bigint AS channel_id,
	topic::text AS topic,
	COALESCE(question::text, '') AS question,
	answer::text AS answer
FROM faq
WHERE $1::bigint IS NULL OR channel_id = $1
ORDER BY id",
		)
		.bind(channel_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|row| {
				SourceRecord::Faq(FaqRecord {
					id: row.id,
					channel_id: row.channel_id,
					topic: row.topic,
					question: row.question,
					answer: row.answer,
				})
			})
			.collect())
	}

	async fn load_services(&self, channel_id: Option<i64>) -> Result<Vec<SourceRecord>> {
		let rows: Vec<ServiceRow> = sqlx::query_as(
			"\
SELECT
	id::bigint AS id,
	channel_id::bigint AS channel_id,
	COALESCE(services_name::text, '') AS services_name,
	description::text AS description,
	indications::text AS indications,
	contraindications::text AS contraindications,
	pre_session_instructions::text AS pre_session_instructions,
	body_parts::text AS body_parts
FROM services
WHERE $1::bigint IS NULL OR channel_id = $1
ORDER BY id",
		)
		.bind(channel_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|row| {
				SourceRecord::Service(ServiceRecord {
					id: row.id,
					channel_id: row.channel_id,
					services_name: row.services_name,
					description: row.description,
					indications: row.indications,
					contraindications: row.contraindications,
					pre_session_instructions: row.pre_session_instructions,
					body_parts: row.body_parts,
				})
			})
			.collect())
	}

	async fn load_products(&self, channel_id: Option<i64>) -> Result<Vec<SourceRecord>> {
		let rows: Vec<ProductRow> = sqlx::query_as(
			"\
SELECT
	id::bigint AS id,
	channel_id::bigint AS channel_id,
	COALESCE(product_search::text, '') AS product_search,
	product_id::text AS product_id,
	product_name::text AS product_name,
	product_type::text AS product_type,
	body_parts::text AS body_parts,
	indications_key::text AS indications_key,
	contraindications_key::text AS contraindications_key,
	duration::text AS duration,
	price_min::float8 AS price_min,
	price_max::float8 AS price_max
FROM product_service_view
WHERE $1::bigint IS NULL OR channel_id = $1
ORDER BY id",
		)
		.bind(channel_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|row| {
				SourceRecord::Product(ProductRecord {
					id: row.id,
					channel_id: row.channel_id,
					product_search: row.product_search,
					product_id: row.product_id,
					product_name: row.product_name,
					product_type: row.product_type,
					body_parts: row.body_parts,
					indications_key: row.indications_key,
					contraindications_key: row.contraindications_key,
					duration: row.duration,
					price_min: row.price_min,
					price_max: row.price_max,
				})
			})
			.collect())
	}
}
