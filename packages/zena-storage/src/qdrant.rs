use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Datatype, Distance,
		FieldType, Filter, Fusion, HnswConfigDiffBuilder, Modifier, PointId, PointStruct,
		PrefetchQueryBuilder, Query, QueryPointsBuilder, ScrollPointsBuilder,
		SparseVectorParamsBuilder, SparseVectorsConfigBuilder, TextIndexParamsBuilder,
		TokenizerType, UpsertPointsBuilder, Value as QdrantValue, Vector, VectorInput,
		VectorParamsBuilder, VectorsConfigBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use serde_json::{Map, Number, Value};

use crate::Result;
use zena_domain::{
	FilterCondition, MatchValue, Payload as DomainPayload, Point, QueryVector, SearchFilter,
	SearchHit,
};

pub const DENSE_VECTOR_NAME: &str = "ada-embedding";
pub const BM25_VECTOR_NAME: &str = "bm25";

const HNSW_M: u64 = 32;
const HNSW_EF_CONSTRUCT: u64 = 200;
const HNSW_FULL_SCAN_THRESHOLD: u64 = 50_000;
const HNSW_MAX_INDEXING_THREADS: u64 = 4;
const TEXT_INDEX_MIN_TOKEN_LEN: u64 = 1;
const TEXT_INDEX_MAX_TOKEN_LEN: u64 = 15;

pub struct QdrantStore {
	pub client: Qdrant,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &zena_config::Qdrant) -> Result<Self> {
		let client =
			Qdrant::from_url(&cfg.url).timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self { client, vector_dim: cfg.vector_dim })
	}

	/// Deletes a collection. Returns `false` when it did not exist.
	pub async fn delete_collection(&self, collection: &str) -> Result<bool> {
		if !self.client.collection_exists(collection).await? {
			return Ok(false);
		}

		self.client.delete_collection(collection).await?;

		Ok(true)
	}

	/// Creates a collection with a float16 cosine dense space and an IDF-weighted sparse space.
	pub async fn create_collection(&self, collection: &str) -> Result<()> {
		let mut vectors = VectorsConfigBuilder::default();

		vectors.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine)
				.datatype(Datatype::Float16 as i32),
		);

		let mut sparse = SparseVectorsConfigBuilder::default();

		sparse.add_named_vector_params(
			BM25_VECTOR_NAME,
			SparseVectorParamsBuilder::default().modifier(Modifier::Idf as i32),
		);

		self.client
			.create_collection(
				CreateCollectionBuilder::new(collection)
					.vectors_config(vectors)
					.sparse_vectors_config(sparse)
					.hnsw_config(
						HnswConfigDiffBuilder::default()
							.m(HNSW_M)
							.ef_construct(HNSW_EF_CONSTRUCT)
							.full_scan_threshold(HNSW_FULL_SCAN_THRESHOLD)
							.max_indexing_threads(HNSW_MAX_INDEXING_THREADS),
					),
			)
			.await?;

		Ok(())
	}

	pub async fn create_text_index(&self, collection: &str, field: &str) -> Result<()> {
		self.client
			.create_field_index(
				CreateFieldIndexCollectionBuilder::new(collection, field, FieldType::Text)
					.field_index_params(
						TextIndexParamsBuilder::new(TokenizerType::Word)
							.min_token_len(TEXT_INDEX_MIN_TOKEN_LEN)
							.max_token_len(TEXT_INDEX_MAX_TOKEN_LEN)
							.lowercase(true),
					)
					.wait(true),
			)
			.await?;

		Ok(())
	}

	pub async fn upsert_points(&self, collection: &str, points: Vec<Point>) -> Result<()> {
		let points = points.into_iter().map(to_point_struct).collect::<Vec<_>>();

		self.client.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true)).await?;

		Ok(())
	}

	pub async fn query_nearest(
		&self,
		collection: &str,
		vector: QueryVector,
		filter: Option<&SearchFilter>,
		limit: u64,
	) -> Result<Vec<SearchHit>> {
		let (input, using) = to_vector_input(vector);
		let mut search = QueryPointsBuilder::new(collection)
			.query(Query::new_nearest(input))
			.using(using)
			.with_payload(true)
			.limit(limit);

		if let Some(filter) = filter {
			search = search.filter(to_qdrant_filter(filter));
		}

		let response = self.client.query(search).await?;

		Ok(response
			.result
			.into_iter()
			.filter_map(|point| {
				Some(SearchHit {
					id: point_id_to_u64(point.id.as_ref()?)?,
					score: Some(point.score),
					payload: payload_to_json(point.payload),
				})
			})
			.collect())
	}

	/// Runs one prefetch per vector and fuses the candidate lists with Reciprocal Rank Fusion.
	pub async fn query_fused(
		&self,
		collection: &str,
		vectors: Vec<QueryVector>,
		filter: Option<&SearchFilter>,
		prefetch_limit: u64,
		limit: u64,
	) -> Result<Vec<SearchHit>> {
		let filter = filter.map(to_qdrant_filter);
		let mut search = QueryPointsBuilder::new(collection);

		for vector in vectors {
			let (input, using) = to_vector_input(vector);
			let mut prefetch = PrefetchQueryBuilder::default()
				.query(Query::new_nearest(input))
				.using(using)
				.limit(prefetch_limit);

			if let Some(filter) = filter.as_ref() {
				prefetch = prefetch.filter(filter.clone());
			}

			search = search.add_prefetch(prefetch);
		}

		let search = search.with_payload(true).query(Fusion::Rrf).limit(limit);
		let response = self.client.query(search).await?;

		Ok(response
			.result
			.into_iter()
			.filter_map(|point| {
				Some(SearchHit {
					id: point_id_to_u64(point.id.as_ref()?)?,
					score: Some(point.score),
					payload: payload_to_json(point.payload),
				})
			})
			.collect())
	}

	/// Lists points under a filter without ranking.
	pub async fn scroll(
		&self,
		collection: &str,
		filter: Option<&SearchFilter>,
		limit: u32,
	) -> Result<Vec<SearchHit>> {
		let mut scroll = ScrollPointsBuilder::new(collection).limit(limit).with_payload(true);

		if let Some(filter) = filter {
			scroll = scroll.filter(to_qdrant_filter(filter));
		}

		let response = self.client.scroll(scroll).await?;

		Ok(response
			.result
			.into_iter()
			.filter_map(|point| {
				Some(SearchHit {
					id: point_id_to_u64(point.id.as_ref()?)?,
					score: None,
					payload: payload_to_json(point.payload),
				})
			})
			.collect())
	}
}

pub fn to_qdrant_filter(filter: &SearchFilter) -> Filter {
	let convert = |conditions: &[FilterCondition]| {
		conditions.iter().map(to_qdrant_condition).collect::<Vec<_>>()
	};

	Filter {
		must: convert(&filter.must),
		should: convert(&filter.should),
		must_not: convert(&filter.must_not),
		..Default::default()
	}
}

fn to_qdrant_condition(condition: &FilterCondition) -> Condition {
	match condition {
		FilterCondition::Exact { field, value: MatchValue::Integer(value) } =>
			Condition::matches(field.as_str(), *value),
		FilterCondition::Exact { field, value: MatchValue::Keyword(value) } =>
			Condition::matches(field.as_str(), value.clone()),
		FilterCondition::Text { field, text } => Condition::matches_text(field.as_str(), text.as_str()),
	}
}

fn to_vector_input(vector: QueryVector) -> (VectorInput, &'static str) {
	match vector {
		QueryVector::Dense(dense) => (VectorInput::from(dense), DENSE_VECTOR_NAME),
		QueryVector::Sparse(sparse) =>
			(VectorInput::new_sparse(sparse.indices, sparse.values), BM25_VECTOR_NAME),
	}
}

fn to_point_struct(point: Point) -> PointStruct {
	let mut vectors = HashMap::new();

	vectors.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(point.dense));
	vectors.insert(
		BM25_VECTOR_NAME.to_string(),
		Vector::new_sparse(point.sparse.indices, point.sparse.values),
	);

	let mut payload = Payload::new();

	for (key, value) in point.payload {
		payload.insert(key, value);
	}

	PointStruct::new(point.id, vectors, payload)
}

fn point_id_to_u64(point_id: &PointId) -> Option<u64> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Num(id)) => Some(*id),
		Some(PointIdOptions::Uuid(_)) | None => None,
	}
}

pub fn payload_to_json(payload: HashMap<String, QdrantValue>) -> DomainPayload {
	payload.into_iter().map(|(key, value)| (key, value_to_json(value))).collect()
}

fn value_to_json(value: QdrantValue) -> Value {
	match value.kind {
		Some(Kind::NullValue(_)) | None => Value::Null,
		Some(Kind::BoolValue(flag)) => Value::Bool(flag),
		Some(Kind::IntegerValue(number)) => Value::from(number),
		Some(Kind::DoubleValue(number)) => Number::from_f64(number).map_or(Value::Null, Value::Number),
		Some(Kind::StringValue(text)) => Value::String(text),
		Some(Kind::ListValue(list)) => Value::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(object)) => Value::Object(
			object.fields.into_iter().map(|(key, value)| (key, value_to_json(value))).collect::<Map<_, _>>(),
		),
	}
}
