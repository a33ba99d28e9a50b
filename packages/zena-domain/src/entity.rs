use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Text payload fields indexed for full-text filtering on product collections.
pub const PRODUCT_TEXT_INDEX_FIELDS: [&str; 4] =
	["indications_key", "contraindications_key", "body_parts", "product_type"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Faq,
	Services,
	Products,
}
impl EntityKind {
	pub const ALL: [Self; 3] = [Self::Faq, Self::Services, Self::Products];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Faq => "faq",
			Self::Services => "services",
			Self::Products => "products",
		}
	}

	/// The field embedded into both vector spaces. Records with a blank value are never indexed.
	pub fn primary_field(self) -> &'static str {
		match self {
			Self::Faq => "question",
			Self::Services => "services_name",
			Self::Products => "product_search",
		}
	}

	pub fn text_index_fields(self) -> &'static [&'static str] {
		match self {
			Self::Faq | Self::Services => &[],
			Self::Products => &PRODUCT_TEXT_INDEX_FIELDS,
		}
	}
}
impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for EntityKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"faq" => Ok(Self::Faq),
			"services" | "service" => Ok(Self::Services),
			"products" | "product" => Ok(Self::Products),
			other => Err(format!("Unknown entity {other:?}.")),
		}
	}
}
