pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Source unavailable: {message}")]
	SourceUnavailable { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Vector store error: {message}")]
	VectorStore { message: String },
	#[error("Index integrity error: {message}")]
	IndexIntegrity { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// A missing collection or point reported by the vector store.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<zena_providers::Error> for Error {
	fn from(err: zena_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
impl From<zena_storage::Error> for Error {
	fn from(err: zena_storage::Error) -> Self {
		if err.is_not_found() {
			return Self::NotFound { message: err.to_string() };
		}

		match err {
			zena_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			zena_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			zena_storage::Error::NotFound(message) => Self::NotFound { message },
			zena_storage::Error::Qdrant(inner) => Self::VectorStore { message: inner.to_string() },
		}
	}
}
