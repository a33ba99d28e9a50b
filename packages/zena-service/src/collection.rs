use crate::{Result, RetryPolicy, VectorStore};

pub struct CollectionManager<'a> {
	pub store: &'a dyn VectorStore,
	pub retry: RetryPolicy,
}
impl CollectionManager<'_> {
	/// Drops and recreates `collection`, then builds one text index per distinct field.
	///
	/// A missing collection is not an error. Any other delete failure is returned before the create
	/// is attempted. Concurrent resets of the same name must be serialized by the caller.
	pub async fn reset(&self, collection: &str, text_index_fields: &[&str]) -> Result<()> {
		match self.store.delete_collection(collection).await {
			Ok(true) => tracing::info!(collection, "Collection deleted."),
			Ok(false) => tracing::info!(collection, "Collection does not exist. Nothing to delete."),
			Err(err) if err.is_not_found() => {
				tracing::info!(collection, error = %err, "Collection not found during delete.");
			},
			Err(err) => {
				tracing::error!(collection, error = %err, "Failed to delete collection.");

				return Err(err);
			},
		}

		self.retry
			.execute("create_collection", || self.store.create_collection(collection))
			.await?;

		let mut indexed: Vec<&str> = Vec::with_capacity(text_index_fields.len());

		for field in text_index_fields.iter().copied() {
			if indexed.contains(&field) {
				continue;
			}

			self.retry
				.execute("create_text_index", || self.store.create_text_index(collection, field))
				.await?;

			indexed.push(field);
		}

		tracing::info!(collection, text_indexes = indexed.len(), "Collection ready.");

		Ok(())
	}
}
