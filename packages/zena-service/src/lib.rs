pub mod collection;
pub mod embedding;
pub mod filter;
pub mod fusion;
pub mod indexer;
pub mod links;
pub mod retrieval;
pub mod retry;
pub mod update;

mod error;

pub use collection::CollectionManager;
pub use embedding::{EmbeddedBatch, EmbeddingGenerator};
pub use error::{Error, Result};
pub use filter::{FilterCriteria, build_filter};
pub use indexer::{RebuildOutcome, RebuildReport, RebuildRequest};
pub use links::{LinkRebuildRequest, LinkReport};
pub use retrieval::{SearchMode, SearchRequest, SearchResponse};
pub use retry::RetryPolicy;
pub use update::{StepTiming, UpdateRequest, UpdateResponse, UpdateStep};

use std::{
	collections::HashMap,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use zena_config::{Config, EmbeddingProviderConfig};
use zena_domain::{
	EntityKind, LinkCandidate, Point, ProductServiceLink, QueryVector, SearchFilter, SearchHit,
	SourceRecord, SparseVector,
};
use zena_providers::{Bm25Encoder, EmbeddingClient};
use zena_storage::{
	db::Db,
	integrity::IntegrityReport,
	links::LinkWrite,
	qdrant::QdrantStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Schema of the table whose B-tree indexes guard the link rebuild.
pub const LINKED_TABLE_SCHEMA: &str = "public";
pub const LINKED_TABLE: &str = "products";
pub const LINKED_TABLE_PRIORITY_INDEX: &str = "products_article_key";

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait SparseEncoder
where
	Self: Send + Sync,
{
	fn embed_passages<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<SparseVector>>>;

	fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<SparseVector>>;
}

/// Named-vector collection store holding one dense and one sparse space per point.
pub trait VectorStore
where
	Self: Send + Sync,
{
	/// Returns `false` when the collection did not exist.
	fn delete_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool>>;

	fn create_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<()>>;

	fn create_text_index<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
	) -> BoxFuture<'a, Result<()>>;

	fn upsert_points<'a>(
		&'a self,
		collection: &'a str,
		points: Vec<Point>,
	) -> BoxFuture<'a, Result<()>>;

	fn query_nearest<'a>(
		&'a self,
		collection: &'a str,
		vector: QueryVector,
		filter: Option<&'a SearchFilter>,
		limit: u64,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>>;

	fn query_fused<'a>(
		&'a self,
		collection: &'a str,
		vectors: Vec<QueryVector>,
		filter: Option<&'a SearchFilter>,
		prefetch_limit: u64,
		limit: u64,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>>;

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		filter: Option<&'a SearchFilter>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>>;
}

/// Relational source of truth for catalog rows and product-service links.
pub trait SourceStore
where
	Self: Send + Sync,
{
	fn load_records<'a>(
		&'a self,
		kind: EntityKind,
		channel_id: Option<i64>,
	) -> BoxFuture<'a, Result<Vec<SourceRecord>>>;

	fn channel_exists<'a>(&'a self, channel_id: i64) -> BoxFuture<'a, Result<bool>>;

	fn link_candidates<'a>(&'a self, channel_id: i64) -> BoxFuture<'a, Result<Vec<LinkCandidate>>>;

	fn repair_link_indexes<'a>(&'a self) -> BoxFuture<'a, Result<IntegrityReport>>;

	fn replace_links<'a>(
		&'a self,
		channel_id: i64,
		links: &'a [ProductServiceLink],
	) -> BoxFuture<'a, Result<LinkWrite>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub sparse: Arc<dyn SparseEncoder>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, sparse: Arc<dyn SparseEncoder>) -> Self {
		Self { embedding, sparse }
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		let embedding = EmbeddingClient::new(&cfg.providers.embedding)?;
		let sparse = Bm25Encoder::new(&cfg.providers.sparse)?;

		Ok(Self::new(Arc::new(embedding), Arc::new(sparse)))
	}
}

pub struct ZenaService {
	pub cfg: Config,
	pub source: Arc<dyn SourceStore>,
	pub vectors: Arc<dyn VectorStore>,
	pub providers: Providers,
	pub retry: RetryPolicy,
	rebuild_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl ZenaService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Result<Self> {
		let providers = Providers::from_config(&cfg)?;

		Ok(Self::with_parts(cfg, Arc::new(db), Arc::new(qdrant), providers))
	}

	pub fn with_parts(
		cfg: Config,
		source: Arc<dyn SourceStore>,
		vectors: Arc<dyn VectorStore>,
		providers: Providers,
	) -> Self {
		let retry = RetryPolicy::from_config(&cfg.retry);

		Self { cfg, source, vectors, providers, retry, rebuild_locks: Mutex::new(HashMap::new()) }
	}

	pub fn embeddings(&self) -> EmbeddingGenerator<'_> {
		EmbeddingGenerator {
			provider: self.providers.embedding.as_ref(),
			sparse: self.providers.sparse.as_ref(),
			cfg: &self.cfg.providers.embedding,
			vector_dim: self.cfg.storage.qdrant.vector_dim,
			retry: self.retry,
		}
	}

	pub fn collections(&self) -> CollectionManager<'_> {
		CollectionManager { store: self.vectors.as_ref(), retry: self.retry }
	}

	/// The configured collection that mirrors `kind`.
	pub fn collection_for(&self, kind: EntityKind) -> &str {
		let collections = &self.cfg.storage.qdrant.collections;

		match kind {
			EntityKind::Faq => &collections.faq,
			EntityKind::Services => &collections.services,
			EntityKind::Products => &collections.products,
		}
	}

	/// Serializes rebuilds of one collection inside this service instance.
	pub(crate) async fn lock_collection(&self, collection: &str) -> OwnedMutexGuard<()> {
		let lock = {
			let mut locks = self.rebuild_locks.lock().unwrap_or_else(|err| err.into_inner());

			locks.entry(collection.to_string()).or_default().clone()
		};

		lock.lock_owned().await
	}
}

impl EmbeddingProvider for EmbeddingClient {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(EmbeddingClient::embed(self, cfg, texts).await?) })
	}
}

impl SparseEncoder for Bm25Encoder {
	fn embed_passages<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<SparseVector>>> {
		Box::pin(async move { Ok(Bm25Encoder::embed_passages(self, texts)) })
	}

	fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<SparseVector>> {
		Box::pin(async move { Ok(Bm25Encoder::embed_query(self, text)) })
	}
}

impl VectorStore for QdrantStore {
	fn delete_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(QdrantStore::delete_collection(self, collection).await?) })
	}

	fn create_collection<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::create_collection(self, collection).await?) })
	}

	fn create_text_index<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::create_text_index(self, collection, field).await?) })
	}

	fn upsert_points<'a>(
		&'a self,
		collection: &'a str,
		points: Vec<Point>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert_points(self, collection, points).await?) })
	}

	fn query_nearest<'a>(
		&'a self,
		collection: &'a str,
		vector: QueryVector,
		filter: Option<&'a SearchFilter>,
		limit: u64,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move {
			Ok(QdrantStore::query_nearest(self, collection, vector, filter, limit).await?)
		})
	}

	fn query_fused<'a>(
		&'a self,
		collection: &'a str,
		vectors: Vec<QueryVector>,
		filter: Option<&'a SearchFilter>,
		prefetch_limit: u64,
		limit: u64,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move {
			Ok(QdrantStore::query_fused(self, collection, vectors, filter, prefetch_limit, limit)
				.await?)
		})
	}

	fn scroll<'a>(
		&'a self,
		collection: &'a str,
		filter: Option<&'a SearchFilter>,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move { Ok(QdrantStore::scroll(self, collection, filter, limit).await?) })
	}
}

impl SourceStore for Db {
	fn load_records<'a>(
		&'a self,
		kind: EntityKind,
		channel_id: Option<i64>,
	) -> BoxFuture<'a, Result<Vec<SourceRecord>>> {
		Box::pin(async move {
			Db::load_records(self, kind, channel_id)
				.await
				.map_err(|err| Error::SourceUnavailable { message: err.to_string() })
		})
	}

	fn channel_exists<'a>(&'a self, channel_id: i64) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(Db::channel_exists(self, channel_id).await?) })
	}

	fn link_candidates<'a>(&'a self, channel_id: i64) -> BoxFuture<'a, Result<Vec<LinkCandidate>>> {
		Box::pin(async move { Ok(Db::link_candidates(self, channel_id).await?) })
	}

	fn repair_link_indexes<'a>(&'a self) -> BoxFuture<'a, Result<IntegrityReport>> {
		Box::pin(async move {
			self.repair_btree_indexes(
				LINKED_TABLE_SCHEMA,
				LINKED_TABLE,
				Some(LINKED_TABLE_PRIORITY_INDEX),
			)
			.await
			.map_err(|err| Error::IndexIntegrity { message: err.to_string() })
		})
	}

	fn replace_links<'a>(
		&'a self,
		channel_id: i64,
		links: &'a [ProductServiceLink],
	) -> BoxFuture<'a, Result<LinkWrite>> {
		Box::pin(async move { Ok(Db::replace_links(self, channel_id, links).await?) })
	}
}
