mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Collections, Config, EmbeddingProviderConfig, Indexing, Postgres, Providers, Qdrant, Retry,
	Search, Service, SparseProviderConfig, Storage,
};

use std::{collections::HashSet, env, fs, path::Path};

pub const API_KEY_ENV: &str = "ZENA_EMBEDDING_API_KEY";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}

	if let Some(dimensions) = cfg.providers.embedding.dimensions
		&& dimensions != cfg.storage.qdrant.vector_dim
	{
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::MissingApiKey { env: API_KEY_ENV });
	}

	validate_collections(&cfg.storage.qdrant.collections)?;

	let sparse = &cfg.providers.sparse;

	if !matches!(sparse.language.as_str(), "russian" | "english") {
		return Err(Error::Validation {
			message: "providers.sparse.language must be one of russian or english.".to_string(),
		});
	}

	for (label, value) in [
		("providers.sparse.k1", sparse.k1),
		("providers.sparse.b", sparse.b),
		("providers.sparse.avg_len", sparse.avg_len),
	] {
		if !value.is_finite() || value < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number, zero or greater."),
			});
		}
	}

	if sparse.avg_len == 0.0 {
		return Err(Error::Validation {
			message: "providers.sparse.avg_len must be greater than zero.".to_string(),
		});
	}
	if cfg.retry.retries == 0 {
		return Err(Error::Validation {
			message: "retry.retries must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [("retry.backoff", cfg.retry.backoff), ("retry.jitter", cfg.retry.jitter)]
	{
		if !value.is_finite() || value < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number, zero or greater."),
			});
		}
	}

	if cfg.indexing.batch_size == 0 {
		return Err(Error::Validation {
			message: "indexing.batch_size must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.max_parallel == 0 {
		return Err(Error::Validation {
			message: "indexing.max_parallel must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("search.dense_limit", cfg.search.dense_limit),
		("search.hybrid_limit", cfg.search.hybrid_limit),
		("search.prefetch_limit", cfg.search.prefetch_limit),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if !matches!(cfg.search.fusion.as_str(), "local" | "server") {
		return Err(Error::Validation {
			message: "search.fusion must be one of local or server.".to_string(),
		});
	}

	Ok(())
}

fn validate_collections(collections: &Collections) -> Result<()> {
	let mut seen = HashSet::new();

	for (label, name) in [
		("faq", &collections.faq),
		("services", &collections.services),
		("products", &collections.products),
		("services_lookup", &collections.services_lookup),
	] {
		if name.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("storage.qdrant.collections.{label} must be non-empty."),
			});
		}
		if !seen.insert(name.as_str()) {
			return Err(Error::Validation {
				message: format!(
					"storage.qdrant.collections.{label} must not reuse another collection name."
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.embedding.api_key.trim().is_empty()
		&& let Ok(key) = env::var(API_KEY_ENV)
	{
		cfg.providers.embedding.api_key = key.trim().to_string();
	}

	cfg.providers.sparse.language = cfg.providers.sparse.language.trim().to_lowercase();
	cfg.search.fusion = cfg.search.fusion.trim().to_lowercase();
}
