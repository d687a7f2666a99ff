use serde::{Deserialize, Serialize};

/// Widest proximity window the scorer will report. Window spans are clamped
/// to this value before being folded into the ranking key.
pub const MAX_SEARCH_TOKENS: u16 = 20;

/// Runtime limits and store key layout for a collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Hard cap on the number of documents a single search returns
    pub max_results: usize,
    /// Bound on both cartesian enumerations (cost tuples and suggestions)
    pub combination_limit: u64,
    /// Candidate leaves fetched per (token, cost) fuzzy lookup
    pub fuzzy_candidates: usize,
    /// Largest edit-distance budget a query may request
    pub max_cost: u8,
    /// Store key prefix for seq_id -> document JSON entries
    pub seq_id_prefix: String,
    /// Store key prefix for user id -> seq_id entries
    pub id_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_results: 100,
            combination_limit: 10,
            fuzzy_candidates: 3,
            max_cost: 2,
            seq_id_prefix: "S".to_string(),
            id_prefix: "I".to_string(),
        }
    }
}

impl Config {
    /// Store key holding the JSON payload for a sequence id
    pub fn seq_id_key(&self, seq_id: u32) -> String {
        format!("{}{}", self.seq_id_prefix, seq_id)
    }

    /// Store key mapping a user-visible id to its sequence id
    pub fn id_key(&self, id: &str) -> String {
        format!("{}{}", self.id_prefix, id)
    }
}
