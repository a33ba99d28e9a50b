// Reciprocal Rank Fusion over vector-store candidate lists.

use std::{cmp::Ordering, collections::HashMap};

use zena_domain::SearchHit;

/// Fuses ranked lists with `score(d) = sum 1 / (k + rank(d))`, ranks starting at 1.
///
/// The payload of the first list that returned a point is kept. Equal scores are ordered by
/// ascending point id so the output is deterministic.
pub fn reciprocal_rank_fusion(lists: &[Vec<SearchHit>], k: u32, limit: usize) -> Vec<SearchHit> {
	let k = k as f32;
	let mut fused: HashMap<u64, SearchHit> = HashMap::new();

	for list in lists {
		for (rank, hit) in list.iter().enumerate() {
			let contribution = 1.0 / (k + (rank + 1) as f32);
			let entry = fused.entry(hit.id).or_insert_with(|| SearchHit {
				id: hit.id,
				score: Some(0.0),
				payload: hit.payload.clone(),
			});

			entry.score = Some(entry.score.unwrap_or_default() + contribution);
		}
	}

	let mut combined = fused.into_values().collect::<Vec<_>>();

	combined.sort_by(|a, b| {
		b.score
			.unwrap_or_default()
			.partial_cmp(&a.score.unwrap_or_default())
			.unwrap_or(Ordering::Equal)
			.then_with(|| a.id.cmp(&b.id))
	});
	combined.truncate(limit);

	combined
}
