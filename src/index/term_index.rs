//! Token index: exact and fuzzy lookup of posting leaves.
//!
//! Two tiers, like a mutable term dictionary frozen into an FST: a `HashMap`
//! owns the leaves and serves exact lookups and all mutation, while a lazily
//! rebuilt `fst::Set` over the token bytes answers fuzzy and prefix queries
//! through a Levenshtein automaton. The snapshot only depends on the key
//! set, so appending postings to an existing leaf never invalidates it.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use fst::automaton::Levenshtein;
use fst::{Automaton, IntoStreamer, Set, Streamer};
use parking_lot::RwLock;

use crate::error::SepiaError;
use crate::index::postings::{DocPosting, Postings};
use crate::models::TokenOrder;
use crate::Result;

/// Index from token to posting leaf with bounded fuzzy lookup
#[derive(Default)]
pub struct TermIndex {
    terms: HashMap<String, Postings>,
    /// FST over the current token set, rebuilt on demand after a token is
    /// added or removed
    snapshot: RwLock<Option<Set<Vec<u8>>>>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed tokens
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate the indexed tokens
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Exact lookup
    pub fn get(&self, token: &str) -> Option<&Postings> {
        self.terms.get(token)
    }

    /// Exact lookup, mutable
    pub fn get_mut(&mut self, token: &str) -> Option<&mut Postings> {
        self.terms.get_mut(token)
    }

    /// Append a document's posting record under `token`, creating the leaf
    /// on first use
    pub fn insert(&mut self, token: &str, doc: &DocPosting) {
        match self.terms.entry(token.to_string()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().append(doc),
            Entry::Vacant(vacant) => {
                vacant.insert(Postings::new()).append(doc);
                *self.snapshot.get_mut() = None;
            }
        }
    }

    /// Drop a token and its leaf entirely
    pub fn remove(&mut self, token: &str) {
        if self.terms.remove(token).is_some() {
            *self.snapshot.get_mut() = None;
        }
    }

    /// Candidate leaves within `max_cost` edits of `token`
    ///
    /// With `prefix` set, a candidate matches when any prefix of it is
    /// within `max_cost` edits of the token. At most `limit` candidates are
    /// returned, ranked per `order` with ties broken by token text so the
    /// result is deterministic.
    pub fn fuzzy_search(
        &self,
        token: &str,
        max_cost: u8,
        limit: usize,
        order: TokenOrder,
        prefix: bool,
    ) -> Result<Vec<(&str, &Postings)>> {
        self.ensure_snapshot()?;
        let guard = self.snapshot.read();
        let Some(set) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let automaton = Levenshtein::new(token, max_cost as u32)
            .map_err(|e| SepiaError::Internal(format!("levenshtein automaton: {}", e)))?;
        let keys = if prefix {
            matching_keys(set, automaton.starts_with())
        } else {
            matching_keys(set, automaton)
        };

        let mut matched: Vec<(&str, &Postings)> = Vec::with_capacity(keys.len());
        for key in keys {
            let Ok(term) = std::str::from_utf8(&key) else {
                continue;
            };
            if let Some((term, postings)) = self.terms.get_key_value(term) {
                matched.push((term.as_str(), postings));
            }
        }

        match order {
            TokenOrder::Frequency => matched.sort_by(|a, b| {
                b.1.doc_frequency()
                    .cmp(&a.1.doc_frequency())
                    .then_with(|| a.0.cmp(b.0))
            }),
            TokenOrder::MaxScore => matched.sort_by(|a, b| {
                b.1.max_score()
                    .cmp(&a.1.max_score())
                    .then_with(|| a.0.cmp(b.0))
            }),
        }
        matched.truncate(limit);
        Ok(matched)
    }

    fn ensure_snapshot(&self) -> Result<()> {
        if self.snapshot.read().is_some() {
            return Ok(());
        }
        let mut keys: Vec<&String> = self.terms.keys().collect();
        keys.sort();
        let set = Set::from_iter(keys)
            .map_err(|e| SepiaError::Internal(format!("term snapshot build: {}", e)))?;
        *self.snapshot.write() = Some(set);
        Ok(())
    }
}

fn matching_keys<A: Automaton>(set: &Set<Vec<u8>>, automaton: A) -> Vec<Vec<u8>> {
    let mut keys = Vec::new();
    let mut stream = set.search(automaton).into_stream();
    while let Some(key) = stream.next() {
        keys.push(key.to_vec());
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(seq_id: u32, score: u32, positions: &[u32]) -> DocPosting {
        DocPosting {
            seq_id,
            score,
            positions: positions.to_vec(),
        }
    }

    fn sample_index() -> TermIndex {
        let mut index = TermIndex::new();
        // "airport" in three docs, "airports" in one high-scoring doc
        index.insert("airport", &doc(1, 3, &[0]));
        index.insert("airport", &doc(2, 1, &[1]));
        index.insert("airport", &doc(5, 2, &[0]));
        index.insert("airports", &doc(3, 90, &[2]));
        index.insert("searchable", &doc(4, 1, &[0]));
        index
    }

    #[test]
    fn test_exact_lookup() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("airport").map(|p| p.doc_frequency()), Some(3));
        assert!(index.get("air").is_none());
    }

    #[test]
    fn test_fuzzy_exact_cost_zero() {
        let index = sample_index();
        let found = index
            .fuzzy_search("airport", 0, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "airport");
    }

    #[test]
    fn test_fuzzy_one_edit() {
        let index = sample_index();
        // "arport" is one insertion away from "airport"
        let found = index
            .fuzzy_search("arport", 1, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "airport");

        let none = index
            .fuzzy_search("arport", 0, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_prefix_mode() {
        let index = sample_index();
        let found = index
            .fuzzy_search("sear", 0, 3, TokenOrder::Frequency, true)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "searchable");

        let none = index
            .fuzzy_search("sear", 0, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_ordering_hints() {
        let index = sample_index();
        // Cost 1 reaches both "airport" (exact) and "airports" (1 edit)
        let by_frequency = index
            .fuzzy_search("airport", 1, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert_eq!(by_frequency.len(), 2);
        assert_eq!(by_frequency[0].0, "airport");

        let by_score = index
            .fuzzy_search("airport", 1, 3, TokenOrder::MaxScore, false)
            .unwrap();
        assert_eq!(by_score[0].0, "airports");
    }

    #[test]
    fn test_result_cap() {
        let mut index = TermIndex::new();
        for (i, term) in ["cat", "car", "can", "cap"].iter().enumerate() {
            index.insert(term, &doc(i as u32 + 1, 0, &[0]));
        }
        let found = index
            .fuzzy_search("cab", 1, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_snapshot_tracks_removals() {
        let mut index = sample_index();
        index.remove("airport");
        let found = index
            .fuzzy_search("arport", 1, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert!(found.is_empty());
        assert!(index.get("airport").is_none());
    }

    #[test]
    fn test_append_after_snapshot_is_visible() {
        let mut index = sample_index();
        // Build the snapshot, then grow an existing leaf
        let _ = index
            .fuzzy_search("airport", 0, 3, TokenOrder::Frequency, false)
            .unwrap();
        index.insert("airport", &doc(9, 4, &[7]));

        let found = index
            .fuzzy_search("airport", 0, 3, TokenOrder::Frequency, false)
            .unwrap();
        assert_eq!(found[0].1.doc_frequency(), 4);
    }
}
