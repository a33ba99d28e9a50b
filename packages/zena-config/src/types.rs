use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retry: Retry,
	#[serde(default)]
	pub indexing: Indexing,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	#[serde(default = "default_qdrant_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_vector_dim")]
	pub vector_dim: u32,
	pub collections: Collections,
}

/// Collection names per indexed entity.
#[derive(Debug, Clone, Deserialize)]
pub struct Collections {
	pub faq: String,
	pub services: String,
	pub products: String,
	/// Channel-scoped services collection used only to resolve product links.
	pub services_lookup: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	#[serde(default)]
	pub sparse: SparseProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Falls back to `ZENA_EMBEDDING_API_KEY` when blank.
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// Sent to the provider only when set. Legacy models reject the parameter.
	pub dimensions: Option<u32>,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SparseProviderConfig {
	#[serde(default = "default_sparse_language")]
	pub language: String,
	#[serde(default = "default_sparse_k1")]
	pub k1: f32,
	#[serde(default = "default_sparse_b")]
	pub b: f32,
	#[serde(default = "default_sparse_avg_len")]
	pub avg_len: f32,
}
impl Default for SparseProviderConfig {
	fn default() -> Self {
		Self {
			language: default_sparse_language(),
			k1: default_sparse_k1(),
			b: default_sparse_b(),
			avg_len: default_sparse_avg_len(),
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Retry {
	#[serde(default = "default_retries")]
	pub retries: u32,
	#[serde(default = "default_backoff")]
	pub backoff: f64,
	#[serde(default = "default_jitter")]
	pub jitter: f64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { retries: default_retries(), backoff: default_backoff(), jitter: default_jitter() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indexing {
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
	#[serde(default = "default_max_parallel")]
	pub max_parallel: usize,
	#[serde(default = "default_probe_faq")]
	pub probe_faq: String,
	#[serde(default = "default_probe_services")]
	pub probe_services: String,
	#[serde(default = "default_probe_products")]
	pub probe_products: String,
}
impl Default for Indexing {
	fn default() -> Self {
		Self {
			batch_size: default_batch_size(),
			max_parallel: default_max_parallel(),
			probe_faq: default_probe_faq(),
			probe_services: default_probe_services(),
			probe_products: default_probe_products(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_dense_limit")]
	pub dense_limit: u32,
	#[serde(default = "default_hybrid_limit")]
	pub hybrid_limit: u32,
	#[serde(default = "default_prefetch_limit")]
	pub prefetch_limit: u32,
	#[serde(default = "default_rrf_k")]
	pub rrf_k: u32,
	/// Either "local" (fuse in-process) or "server" (fuse in Qdrant).
	#[serde(default = "default_fusion")]
	pub fusion: String,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			dense_limit: default_dense_limit(),
			hybrid_limit: default_hybrid_limit(),
			prefetch_limit: default_prefetch_limit(),
			rrf_k: default_rrf_k(),
			fusion: default_fusion(),
		}
	}
}

fn default_qdrant_timeout_ms() -> u64 {
	30_000
}

fn default_vector_dim() -> u32 {
	1_536
}

fn default_sparse_language() -> String {
	"russian".to_string()
}

fn default_sparse_k1() -> f32 {
	1.2
}

fn default_sparse_b() -> f32 {
	0.75
}

fn default_sparse_avg_len() -> f32 {
	256.0
}

fn default_retries() -> u32 {
	3
}

fn default_backoff() -> f64 {
	2.0
}

fn default_jitter() -> f64 {
	1.0
}

fn default_batch_size() -> usize {
	64
}

fn default_max_parallel() -> usize {
	10
}

fn default_probe_faq() -> String {
	"Абонемент".to_string()
}

fn default_probe_services() -> String {
	"Массаж".to_string()
}

fn default_probe_products() -> String {
	"массаж".to_string()
}

fn default_dense_limit() -> u32 {
	5
}

fn default_hybrid_limit() -> u32 {
	12
}

fn default_prefetch_limit() -> u32 {
	12
}

fn default_rrf_k() -> u32 {
	60
}

fn default_fusion() -> String {
	"local".to_string()
}
