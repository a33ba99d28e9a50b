#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
}
impl Error {
	/// Whether a Qdrant error reports a missing collection or point.
	pub fn is_not_found(&self) -> bool {
		match self {
			Self::NotFound(_) => true,
			Self::Qdrant(err) => {
				let message = err.to_string().to_ascii_lowercase();

				message.contains("not found") || message.contains("doesn't exist")
			},
			_ => false,
		}
	}
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
