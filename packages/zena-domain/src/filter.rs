use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
	Integer(i64),
	Keyword(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterCondition {
	/// Exact equality on a keyword or integer payload field.
	Exact { field: String, value: MatchValue },
	/// Full-text match against a text-indexed payload field.
	Text { field: String, text: String },
}
impl FilterCondition {
	pub fn exact(field: impl Into<String>, value: MatchValue) -> Self {
		Self::Exact { field: field.into(), value }
	}

	pub fn text(field: impl Into<String>, text: impl Into<String>) -> Self {
		Self::Text { field: field.into(), text: text.into() }
	}

	pub fn field(&self) -> &str {
		match self {
			Self::Exact { field, .. } | Self::Text { field, .. } => field,
		}
	}
}

/// A non-empty structured filter. Absence of criteria is modelled as `Option::None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
	pub must: Vec<FilterCondition>,
	pub should: Vec<FilterCondition>,
	pub must_not: Vec<FilterCondition>,
}
impl SearchFilter {
	pub fn is_empty(&self) -> bool {
		self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
	}

	pub fn into_option(self) -> Option<Self> {
		if self.is_empty() { None } else { Some(self) }
	}
}
