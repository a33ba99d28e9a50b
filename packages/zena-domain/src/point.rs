use serde::{Deserialize, Serialize};

use crate::Payload;

/// Token-id to weight map, stored as parallel arrays with strictly ascending indices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
	pub indices: Vec<u32>,
	pub values: Vec<f32>,
}
impl SparseVector {
	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}

	pub fn len(&self) -> usize {
		self.indices.len()
	}

	pub fn weight(&self, index: u32) -> Option<f32> {
		self.indices.binary_search(&index).ok().map(|pos| self.values[pos])
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
	pub id: u64,
	pub dense: Vec<f32>,
	pub sparse: SparseVector,
	pub payload: Payload,
}

/// A query vector together with the vector space it targets.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryVector {
	Dense(Vec<f32>),
	Sparse(SparseVector),
}

/// A raw hit returned by the vector store. `score` is `None` for unranked listings.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
	pub id: u64,
	pub score: Option<f32>,
	pub payload: Payload,
}
