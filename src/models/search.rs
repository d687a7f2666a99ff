use serde::{Deserialize, Serialize};

/// Ordering hint for fuzzy candidate ranking
///
/// Candidates within the edit-distance budget are ranked either by how many
/// documents contain them or by the best static score among those documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenOrder {
    /// Rank candidate tokens by posting-list length, most frequent first
    #[default]
    Frequency,
    /// Rank candidate tokens by their best document score, highest first
    MaxScore,
}

/// A full-text search request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query, whitespace separated
    pub query: String,
    /// Per-token typo budget; values above the collection clamp are capped
    pub num_typos: u8,
    /// Number of documents wanted; capped at the collection's `max_results`
    pub num_results: usize,
    /// Fuzzy candidate ordering hint
    pub token_order: TokenOrder,
    /// Match tokens as prefixes instead of whole words
    pub prefix: bool,
}

impl SearchRequest {
    /// Create a request with no typo tolerance and 10 results
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_typos: 0,
            num_results: 10,
            token_order: TokenOrder::Frequency,
            prefix: false,
        }
    }

    /// Set the per-token typo budget
    pub fn with_num_typos(mut self, num_typos: u8) -> Self {
        self.num_typos = num_typos;
        self
    }

    /// Set the number of results wanted
    pub fn with_num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    /// Set the fuzzy candidate ordering hint
    pub fn with_token_order(mut self, token_order: TokenOrder) -> Self {
        self.token_order = token_order;
        self
    }

    /// Enable or disable prefix matching
    pub fn with_prefix(mut self, prefix: bool) -> Self {
        self.prefix = prefix;
        self
    }
}
