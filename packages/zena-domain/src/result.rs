use serde::Serialize;
use serde_json::Value;

use crate::{EntityKind, Payload, SearchHit};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaqItem {
	pub id: Option<i64>,
	pub channel_id: Option<i64>,
	pub topic: Option<String>,
	pub question: Option<String>,
	pub answer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceItem {
	pub id: Option<i64>,
	pub channel_id: Option<i64>,
	pub services_name: Option<String>,
	pub description: Option<String>,
	pub indications: Option<String>,
	pub contraindications: Option<String>,
	pub pre_session_instructions: Option<String>,
	pub body_parts: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductItem {
	pub product_id: Option<String>,
	pub product_name: Option<String>,
	pub product_type: Option<String>,
	pub body_parts: Option<String>,
	pub indications_key: Option<String>,
	pub contraindications_key: Option<String>,
	pub duration: Option<String>,
	pub price: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultItem {
	Faq(FaqItem),
	Service(ServiceItem),
	Product(ProductItem),
}
impl ResultItem {
	pub fn from_payload(kind: EntityKind, payload: &Payload) -> Self {
		match kind {
			EntityKind::Faq => Self::Faq(FaqItem {
				id: int_field(payload, "id"),
				channel_id: int_field(payload, "channel_id"),
				topic: text_field(payload, "topic"),
				question: text_field(payload, "question"),
				answer: text_field(payload, "answer"),
			}),
			EntityKind::Services => Self::Service(ServiceItem {
				id: int_field(payload, "id"),
				channel_id: int_field(payload, "channel_id"),
				services_name: text_field(payload, "services_name"),
				description: text_field(payload, "description"),
				indications: text_field(payload, "indications"),
				contraindications: text_field(payload, "contraindications"),
				pre_session_instructions: text_field(payload, "pre_session_instructions"),
				body_parts: text_field(payload, "body_parts"),
			}),
			EntityKind::Products => Self::Product(ProductItem {
				product_id: text_field(payload, "product_id"),
				product_name: text_field(payload, "product_name"),
				product_type: text_field(payload, "product_type"),
				body_parts: text_field(payload, "body_parts"),
				indications_key: text_field(payload, "indications_key"),
				contraindications_key: text_field(payload, "contraindications_key"),
				duration: text_field(payload, "duration"),
				price: format_price(
					number_field(payload, "price_min"),
					number_field(payload, "price_max"),
				),
			}),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryResult {
	pub id: u64,
	pub score: Option<f32>,
	pub item: ResultItem,
}
impl QueryResult {
	pub fn from_hit(kind: EntityKind, hit: &SearchHit) -> Self {
		Self { id: hit.id, score: hit.score, item: ResultItem::from_payload(kind, &hit.payload) }
	}
}

/// Renders a price range in rubles. A missing bound yields no price at all.
pub fn format_price(price_min: Option<f64>, price_max: Option<f64>) -> Option<String> {
	let (min, max) = (price_min?, price_max?);

	if min == max {
		Some(format!("{} руб.", format_amount(min)))
	} else {
		Some(format!("{} - {} руб.", format_amount(min), format_amount(max)))
	}
}

fn format_amount(value: f64) -> String {
	if value.fract() == 0.0 && value.abs() < 1e15 {
		format!("{}", value as i64)
	} else {
		format!("{value}")
	}
}

fn text_field(payload: &Payload, key: &str) -> Option<String> {
	match payload.get(key)? {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

fn int_field(payload: &Payload, key: &str) -> Option<i64> {
	match payload.get(key)? {
		Value::Number(number) => number.as_i64().or_else(|| {
			number.as_f64().filter(|value| value.fract() == 0.0).map(|value| value as i64)
		}),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}

fn number_field(payload: &Payload, key: &str) -> Option<f64> {
	match payload.get(key)? {
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}
