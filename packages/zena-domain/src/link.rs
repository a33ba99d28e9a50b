use serde::{Deserialize, Serialize};

/// A product of one channel that needs a matching service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
	pub article: String,
	pub product_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductServiceLink {
	pub article: String,
	pub service_id: i64,
}
