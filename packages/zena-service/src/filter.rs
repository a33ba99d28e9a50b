use serde::{Deserialize, Serialize};

use crate::{Error, Result};
use zena_domain::{FilterCondition, MatchValue, SearchFilter};

const CHANNEL_FIELD: &str = "channel_id";
const INDICATIONS_FIELD: &str = "indications_key";
const CONTRAINDICATIONS_FIELD: &str = "contraindications_key";
const BODY_PARTS_FIELD: &str = "body_parts";
const PRODUCT_TYPE_FIELD: &str = "product_type";

/// Structured retrieval criteria. Every term becomes one full-text condition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
	pub channel_id: Option<i64>,
	pub indications: Vec<String>,
	pub contraindications: Vec<String>,
	pub body_parts: Vec<String>,
	pub product_type: Vec<String>,
	/// Indications go to `should` instead of `must`.
	pub use_should: bool,
}
impl FilterCriteria {
	pub fn channel(channel_id: i64) -> Self {
		Self { channel_id: Some(channel_id), ..Default::default() }
	}
}

/// Builds a vector-store filter, or `None` when no criterion is set.
///
/// Caller mistakes are rejected up front: a non-positive channel, a blank term, or a term that is
/// both an indication and a contraindication.
pub fn build_filter(criteria: &FilterCriteria) -> Result<Option<SearchFilter>> {
	let mut filter = SearchFilter::default();

	if let Some(channel_id) = criteria.channel_id {
		if channel_id <= 0 {
			return Err(Error::InvalidRequest {
				message: format!("channel_id must be positive, got {channel_id}."),
			});
		}

		filter.must.push(FilterCondition::exact(CHANNEL_FIELD, MatchValue::Integer(channel_id)));
	}

	let indications = clean_terms("indications", &criteria.indications)?;
	let contraindications = clean_terms("contraindications", &criteria.contraindications)?;
	let body_parts = clean_terms("body_parts", &criteria.body_parts)?;
	let product_types = clean_terms("product_type", &criteria.product_type)?;

	if let Some(conflict) = indications.iter().find(|term| {
		contraindications.iter().any(|other| other.to_lowercase() == term.to_lowercase())
	}) {
		return Err(Error::InvalidRequest {
			message: format!("{conflict:?} is both an indication and a contraindication."),
		});
	}

	for term in indications {
		let condition = FilterCondition::text(INDICATIONS_FIELD, term);

		if criteria.use_should {
			filter.should.push(condition);
		} else {
			filter.must.push(condition);
		}
	}
	for term in body_parts {
		filter.must.push(FilterCondition::text(BODY_PARTS_FIELD, term));
	}
	for term in product_types {
		filter.must.push(FilterCondition::text(PRODUCT_TYPE_FIELD, term));
	}
	for term in contraindications {
		filter.must_not.push(FilterCondition::text(CONTRAINDICATIONS_FIELD, term));
	}

	Ok(filter.into_option())
}

fn clean_terms<'a>(name: &str, terms: &'a [String]) -> Result<Vec<&'a str>> {
	terms
		.iter()
		.map(|term| {
			let trimmed = term.trim();

			if trimmed.is_empty() {
				return Err(Error::InvalidRequest {
					message: format!("{name} must not contain blank terms."),
				});
			}

			Ok(trimmed)
		})
		.collect()
}
