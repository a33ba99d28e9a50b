use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EntityKind, Payload};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
	pub id: i64,
	pub channel_id: i64,
	pub topic: Option<String>,
	pub question: String,
	pub answer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
	pub id: i64,
	pub channel_id: i64,
	pub services_name: String,
	pub description: Option<String>,
	pub indications: Option<String>,
	pub contraindications: Option<String>,
	pub pre_session_instructions: Option<String>,
	pub body_parts: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
	pub id: i64,
	pub channel_id: i64,
	pub product_search: String,
	pub product_id: Option<String>,
	pub product_name: Option<String>,
	pub product_type: Option<String>,
	pub body_parts: Option<String>,
	pub indications_key: Option<String>,
	pub contraindications_key: Option<String>,
	pub duration: Option<String>,
	pub price_min: Option<f64>,
	pub price_max: Option<f64>,
}

/// A source row snapshot. The payload stored next to a point is the row itself, without a tag.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceRecord {
	Faq(FaqRecord),
	Service(ServiceRecord),
	Product(ProductRecord),
}
impl SourceRecord {
	pub fn kind(&self) -> EntityKind {
		match self {
			Self::Faq(_) => EntityKind::Faq,
			Self::Service(_) => EntityKind::Services,
			Self::Product(_) => EntityKind::Products,
		}
	}

	pub fn id(&self) -> i64 {
		match self {
			Self::Faq(record) => record.id,
			Self::Service(record) => record.id,
			Self::Product(record) => record.id,
		}
	}

	pub fn channel_id(&self) -> i64 {
		match self {
			Self::Faq(record) => record.channel_id,
			Self::Service(record) => record.channel_id,
			Self::Product(record) => record.channel_id,
		}
	}

	pub fn primary_text(&self) -> &str {
		match self {
			Self::Faq(record) => &record.question,
			Self::Service(record) => &record.services_name,
			Self::Product(record) => &record.product_search,
		}
	}

	pub fn has_primary_text(&self) -> bool {
		!self.primary_text().trim().is_empty()
	}

	pub fn to_payload(&self) -> Payload {
		let value = match self {
			Self::Faq(record) => serde_json::to_value(record),
			Self::Service(record) => serde_json::to_value(record),
			Self::Product(record) => serde_json::to_value(record),
		};

		match value {
			Ok(Value::Object(map)) => map,
			_ => Payload::new(),
		}
	}

	pub fn from_payload(kind: EntityKind, payload: Payload) -> serde_json::Result<Self> {
		let value = Value::Object(payload);

		Ok(match kind {
			EntityKind::Faq => Self::Faq(serde_json::from_value(value)?),
			EntityKind::Services => Self::Service(serde_json::from_value(value)?),
			EntityKind::Products => Self::Product(serde_json::from_value(value)?),
		})
	}
}
