use crate::{EmbeddingProvider, Error, Result, RetryPolicy, SparseEncoder};
use zena_config::EmbeddingProviderConfig;
use zena_domain::SparseVector;

/// Dense and sparse vectors for one batch, position-aligned with its input texts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbeddedBatch {
	pub dense: Vec<Vec<f32>>,
	pub sparse: Vec<SparseVector>,
}
impl EmbeddedBatch {
	pub fn len(&self) -> usize {
		self.dense.len()
	}

	pub fn is_empty(&self) -> bool {
		self.dense.is_empty()
	}
}

pub struct EmbeddingGenerator<'a> {
	pub provider: &'a dyn EmbeddingProvider,
	pub sparse: &'a dyn SparseEncoder,
	pub cfg: &'a EmbeddingProviderConfig,
	pub vector_dim: u32,
	pub retry: RetryPolicy,
}
impl EmbeddingGenerator<'_> {
	/// Embeds texts with the remote dense model in one batched call.
	///
	/// Newlines become spaces and blank entries are dropped before the call, so the result can be
	/// shorter than `texts`. Nothing is sent when no text remains.
	pub async fn dense_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let prepared = prepare_dense_inputs(texts);

		if prepared.is_empty() {
			return Ok(Vec::new());
		}

		let vectors = self
			.retry
			.execute("dense_embed", || self.provider.embed(self.cfg, &prepared))
			.await?;

		if vectors.len() != prepared.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					prepared.len()
				),
			});
		}
		if let Some(vector) = vectors.iter().find(|vector| vector.len() != self.vector_dim as usize)
		{
			return Err(Error::Provider {
				message: format!(
					"Embedding dimension mismatch. Expected {}, got {}.",
					self.vector_dim,
					vector.len()
				),
			});
		}

		Ok(vectors)
	}

	pub async fn sparse_embed(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
		let vectors =
			self.retry.execute("sparse_embed", || self.sparse.embed_passages(texts)).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Sparse encoder returned {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}

		Ok(vectors)
	}

	/// Embeds an already filtered batch into both spaces and checks that positions line up.
	pub async fn embed_batch(&self, texts: &[String]) -> Result<EmbeddedBatch> {
		let dense = self.dense_embed(texts).await?;
		let sparse = self.sparse_embed(texts).await?;

		if dense.len() != texts.len() || sparse.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding alignment broken: {} texts, {} dense, {} sparse.",
					texts.len(),
					dense.len(),
					sparse.len()
				),
			});
		}

		Ok(EmbeddedBatch { dense, sparse })
	}

	pub async fn dense_query(&self, text: &str) -> Result<Vec<f32>> {
		let mut vectors = self.dense_embed(&[text.to_string()]).await?;

		vectors.pop().ok_or_else(|| Error::InvalidRequest {
			message: "Query text must not be blank.".to_string(),
		})
	}

	pub async fn sparse_query(&self, text: &str) -> Result<SparseVector> {
		self.retry.execute("sparse_query", || self.sparse.embed_query(text)).await
	}
}

fn prepare_dense_inputs(texts: &[String]) -> Vec<String> {
	texts
		.iter()
		.map(|text| text.replace(['\r', '\n'], " "))
		.filter(|text| !text.trim().is_empty())
		.collect()
}
