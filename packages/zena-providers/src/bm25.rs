//! Local BM25 sparse encoder.
//!
//! Tokens are produced by a stop-word filtering, Snowball stemming analyzer and hashed into a
//! 32-bit id space. Passage weights carry BM25 term saturation and length normalisation; the
//! inverse document frequency is applied by the vector store through the `IDF` modifier.

use std::collections::BTreeMap;

use tantivy::tokenizer::{
	Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
	TextAnalyzer, TokenStream,
};

use crate::{Error, Result};
use zena_config::SparseProviderConfig;
use zena_domain::SparseVector;

const MAX_TOKEN_LEN: usize = 40;

#[derive(Clone)]
pub struct Bm25Encoder {
	analyzer: TextAnalyzer,
	k1: f32,
	b: f32,
	avg_len: f32,
}
impl Bm25Encoder {
	pub fn new(cfg: &SparseProviderConfig) -> Result<Self> {
		let language = match cfg.language.as_str() {
			"russian" => Language::Russian,
			"english" => Language::English,
			other => {
				return Err(Error::InvalidConfig {
					message: format!("Unsupported sparse model language {other:?}."),
				});
			},
		};
		let stop_words = StopWordFilter::new(language).ok_or_else(|| Error::InvalidConfig {
			message: format!("No stop-word list for language {:?}.", cfg.language),
		})?;
		let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
			.filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
			.filter(LowerCaser)
			.filter(stop_words)
			.filter(Stemmer::new(language))
			.build();

		Ok(Self { analyzer, k1: cfg.k1, b: cfg.b, avg_len: cfg.avg_len })
	}

	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();

		while stream.advance() {
			tokens.push(stream.token().text.clone());
		}

		tokens
	}

	pub fn embed_passages(&self, texts: &[String]) -> Vec<SparseVector> {
		texts.iter().map(|text| self.embed_passage(text)).collect()
	}

	pub fn embed_passage(&self, text: &str) -> SparseVector {
		let tokens = self.tokenize(text);
		let doc_len = tokens.len() as f32;
		let mut counts = BTreeMap::<u32, f32>::new();

		for token in &tokens {
			*counts.entry(token_id(token)).or_default() += 1.0;
		}

		let norm = self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_len);
		let (indices, values) =
			counts.into_iter().map(|(id, tf)| (id, tf * (self.k1 + 1.0) / (tf + norm))).unzip();

		SparseVector { indices, values }
	}

	/// Query vectors weight each distinct token equally.
	pub fn embed_query(&self, text: &str) -> SparseVector {
		let mut ids = self.tokenize(text).iter().map(|token| token_id(token)).collect::<Vec<_>>();

		ids.sort_unstable();
		ids.dedup();

		let values = vec![1.0; ids.len()];

		SparseVector { indices: ids, values }
	}
}

pub fn token_id(token: &str) -> u32 {
	let hash = blake3::hash(token.as_bytes());
	let bytes = hash.as_bytes();

	u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
