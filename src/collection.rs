//! A searchable collection of JSON documents.
//!
//! Writes keep four structures consistent: the token index (posting leaves
//! per title token), the per-document static score map, and the two store
//! key families (`S{seq_id}` -> document JSON, `I{id}` -> seq_id). Reads run
//! the typo-tolerant query planner: enumerate per-token edit-cost
//! combinations, fetch candidate leaves per token, intersect candidate
//! suggestions, score by proximity and static score, and collect the top
//! results.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::config::{Config, MAX_SEARCH_TOKENS};
use crate::error::SepiaError;
use crate::index::{match_score, DocPosting, MatchScore, Postings, TermIndex, Topster};
use crate::models::{Document, SearchRequest, SeqId};
use crate::persistence::{DocStore, Store};
use crate::tokenizer;
use crate::Result;

/// Capacity of the per-suggestion top-K selector
const TOP_K: usize = 100;

/// A typo-tolerant full-text search collection
///
/// Single-threaded: writes take `&mut self`, searches take `&self` and do
/// not mutate index or store state.
pub struct Collection {
    config: Config,
    store: Box<dyn Store>,
    terms: TermIndex,
    doc_scores: HashMap<SeqId, u32>,
    seq_id: SeqId,
}

impl Collection {
    /// Open a collection bound to an on-disk store under `state_dir`
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self> {
        let store = DocStore::open(state_dir)?;
        Ok(Self::with_store(Box::new(store), Config::default()))
    }

    /// Build a collection over any store implementation
    pub fn with_store(store: Box<dyn Store>, config: Config) -> Self {
        Self {
            config,
            store,
            terms: TermIndex::new(),
            doc_scores: HashMap::new(),
            seq_id: 0,
        }
    }

    /// The configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of live documents
    pub fn num_documents(&self) -> usize {
        self.doc_scores.len()
    }

    /// The token index (read-only; useful for diagnostics and tests)
    pub fn term_index(&self) -> &TermIndex {
        &self.terms
    }

    fn next_seq_id(&mut self) -> SeqId {
        self.seq_id += 1;
        self.seq_id
    }

    /// Index a JSON document and return its id
    ///
    /// The document must be an object with a string `title` and an integer
    /// `points >= 0`; an absent `id` is assigned from the sequence id.
    /// Adding a document whose `id` is already present replaces the old one
    /// (remove-then-insert).
    pub fn add(&mut self, json: &str) -> Result<String> {
        let mut document = Document::from_json(json)?;

        let seq_id = self.next_seq_id();
        let id = match document.id() {
            Some(existing) => existing.to_string(),
            None => {
                let assigned = seq_id.to_string();
                document.set_id(assigned.clone());
                assigned
            }
        };

        // Upsert semantics: an already-mapped id is removed first so no
        // postings or store entries are orphaned. Auto-assigned ids get the
        // same treatment: an older document may carry the decimal form of
        // this sequence id as its id.
        if self.store.get(&self.config.id_key(&id))?.is_some() {
            self.remove(&id)?;
        }

        self.store
            .insert(&self.config.seq_id_key(seq_id), &document.to_json())?;
        if let Err(e) = self.store.insert(&self.config.id_key(&id), &seq_id.to_string()) {
            let _ = self.store.remove(&self.config.seq_id_key(seq_id));
            return Err(e);
        }

        let points = document.points();
        for (token, positions) in tokenizer::token_positions(document.title()) {
            self.terms.insert(
                &token,
                &DocPosting {
                    seq_id,
                    score: points,
                    positions,
                },
            );
        }
        self.doc_scores.insert(seq_id, points);

        Ok(id)
    }

    /// Remove a document by id
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let seq_id_str = self
            .store
            .get(&self.config.id_key(id))?
            .ok_or_else(|| SepiaError::NotFound(id.to_string()))?;
        let seq_id: SeqId = seq_id_str.parse().map_err(|_| {
            SepiaError::Internal(format!("malformed seq id mapping for {:?}", id))
        })?;

        let json = self
            .store
            .get(&self.config.seq_id_key(seq_id))?
            .ok_or_else(|| {
                SepiaError::Internal(format!("missing document payload for seq id {}", seq_id))
            })?;
        let document = Document::from_json(&json)?;

        // A title may repeat a token; its leaf holds all occurrences under
        // one entry and must be unindexed exactly once.
        let mut tokens = tokenizer::tokenize(document.title());
        tokens.sort();
        tokens.dedup();

        for token in &tokens {
            let Some(postings) = self.terms.get_mut(token) else {
                continue;
            };
            if !postings.remove_doc(seq_id) {
                return Err(SepiaError::Internal(format!(
                    "document {} missing from postings for token {:?}",
                    seq_id, token
                )));
            }
            if postings.is_empty() {
                self.terms.remove(token);
            }
        }

        self.doc_scores.remove(&seq_id);
        self.store.remove(&self.config.id_key(id))?;
        self.store.remove(&self.config.seq_id_key(seq_id))?;
        Ok(())
    }

    /// Run a search and return matching documents, best first
    ///
    /// Cost combinations are explored cheapest first: each query token
    /// starts at edit cost 0 and is retried at higher costs (up to the typo
    /// budget) when a cheaper lookup finds nothing. Tokens unmatched at any
    /// allowed cost are skipped, and if no candidate set yields results the
    /// rarest token is dropped and the query retried.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<Value>> {
        let search_begin = Instant::now();

        let mut tokens = tokenizer::tokenize(&request.query);
        let max_cost = request.num_typos.min(self.config.max_cost);
        let max_results = request.num_results.min(self.config.max_results);

        let mut results: Vec<Value> = Vec::new();
        let mut total_results = 0usize;
        let mut dedup_seq_ids: HashSet<u64> = HashSet::new();

        // Candidate leaves per (token, cost), kept across cost combinations
        let mut token_cache: HashMap<(String, u8), Vec<(&str, &Postings)>> = HashMap::new();
        // Hit counts per token, feeding the drop-token fallback
        let mut token_to_count: HashMap<String, u32> = HashMap::new();

        let all_costs: Vec<u8> = (0..=max_cost).collect();
        let mut token_to_costs: Vec<Vec<u8>> = vec![all_costs; tokens.len()];

        let cardinality =
            |costs: &[Vec<u8>]| costs.iter().map(|c| c.len() as i64).product::<i64>();

        let mut n: i64 = 0;
        let mut combinations = cardinality(&token_to_costs);

        while n < combinations && n < self.config.combination_limit as i64 {
            // Decode the cost tuple for this iteration, e.g. for a 3-token
            // query: [0, 0, 0], [0, 0, 1], [0, 1, 0], ...
            let mut costs = vec![0u8; token_to_costs.len()];
            let mut rem = n;
            for i in (0..token_to_costs.len()).rev() {
                let radix = token_to_costs[i].len() as i64;
                costs[i] = token_to_costs[i][(rem % radix) as usize];
                rem /= radix;
            }

            let mut token_leaves: Vec<Vec<(&str, &Postings)>> = Vec::new();
            let mut retry_with_larger_cost = false;
            let mut token_index = 0usize;

            while token_index < tokens.len() {
                let token = tokens[token_index].clone();
                let cost = costs[token_index];

                let cache_key = (token.clone(), cost);
                let leaves: Vec<(&str, &Postings)> = match token_cache.get(&cache_key) {
                    Some(hit) => hit.clone(),
                    None => {
                        let found = self.terms.fuzzy_search(
                            &token,
                            cost,
                            self.config.fuzzy_candidates,
                            request.token_order,
                            request.prefix,
                        )?;
                        if !found.is_empty() {
                            token_cache.insert(cache_key, found.clone());
                        }
                        found
                    }
                };

                if !leaves.is_empty() {
                    self.log_leaves(cost, &token, &leaves);
                    token_to_count.insert(token, leaves[0].1.doc_frequency() as u32);
                    token_leaves.push(leaves);
                } else {
                    // No candidates at this cost: retire the cost for this
                    // token and restart the combination enumeration.
                    let mut removed_token = false;
                    if let Some(pos) = token_to_costs[token_index].iter().position(|&c| c == cost) {
                        token_to_costs[token_index].remove(pos);
                        if token_to_costs[token_index].is_empty() {
                            token_to_costs.remove(token_index);
                            tokens.remove(token_index);
                            costs.remove(token_index);
                            removed_token = true;
                        }
                    }

                    n = -1;
                    combinations = cardinality(&token_to_costs);

                    // Unless this token is already at the typo budget, the
                    // remaining tokens will be revisited at a larger cost.
                    if cost != max_cost {
                        retry_with_larger_cost = true;
                        break;
                    }
                    if removed_token {
                        continue; // same index now holds the next token
                    }
                }

                token_index += 1;
            }

            if !token_leaves.is_empty() && !retry_with_larger_cost {
                // Either every token produced candidates or the missing
                // ones were skipped at the typo budget; search with what we
                // have.
                self.search_candidates(
                    &token_leaves,
                    &mut dedup_seq_ids,
                    &mut results,
                    &mut total_results,
                    max_results,
                )?;

                if total_results > 0 {
                    break;
                }
            }

            n += 1;
        }

        if results.is_empty() && !token_to_count.is_empty() {
            // Drop the token with the fewest hits and retry
            let mut token_count_pairs: Vec<(String, u32)> = token_to_count.into_iter().collect();
            token_count_pairs
                .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            let truncated_query = token_count_pairs[..token_count_pairs.len() - 1]
                .iter()
                .map(|(token, _)| token.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            let fallback = SearchRequest::new(truncated_query)
                .with_num_typos(request.num_typos)
                .with_num_results(request.num_results);
            return self.search(&fallback);
        }

        debug!(
            elapsed_us = search_begin.elapsed().as_micros() as u64,
            results = results.len(),
            "search complete"
        );
        Ok(results)
    }

    /// Intersect and score every candidate suggestion, appending matching
    /// documents to `results`
    fn search_candidates(
        &self,
        token_leaves: &[Vec<(&str, &Postings)>],
        dedup_seq_ids: &mut HashSet<u64>,
        results: &mut Vec<Value>,
        total_results: &mut usize,
        max_results: usize,
    ) -> Result<()> {
        let total: i64 = token_leaves.iter().map(|l| l.len() as i64).product();
        let limit = self.config.combination_limit as i64;

        let mut n: i64 = 0;
        while n < total && n < limit {
            // One candidate leaf per query token forms a query suggestion
            let query_suggestion = next_suggestion(token_leaves, n);

            // Seed with the smallest posting list, then shrink
            let mut result_ids = query_suggestion[0].1.ids().to_vec();
            if result_ids.is_empty() {
                n += 1;
                continue;
            }
            for (_, leaf) in &query_suggestion[1..] {
                result_ids = intersect_sorted(&result_ids, &leaf.ids().to_vec());
                if result_ids.is_empty() {
                    break;
                }
            }

            let mut topster: Topster<TOP_K> = Topster::new();
            self.score_results(&mut topster, &query_suggestion, &result_ids)?;
            topster.sort();

            for i in 0..topster.len() {
                if *total_results >= max_results {
                    break;
                }
                let seq_id = topster.key_at(i);
                if dedup_seq_ids.insert(seq_id) {
                    let key = self.config.seq_id_key(seq_id as SeqId);
                    let json = self.store.get(&key)?.ok_or_else(|| {
                        SepiaError::Internal(format!("missing document payload under {:?}", key))
                    })?;
                    let document: Value = serde_json::from_str(&json).map_err(|e| {
                        SepiaError::Internal(format!("stored document is not valid json: {}", e))
                    })?;
                    results.push(document);
                    *total_results += 1;
                }
            }

            if *total_results >= max_results {
                break;
            }
            n += 1;
        }

        Ok(())
    }

    /// Score each intersected document and offer it to the selector
    fn score_results(
        &self,
        topster: &mut Topster<TOP_K>,
        query_suggestion: &[(&str, &Postings)],
        result_ids: &[u32],
    ) -> Result<()> {
        for &doc_id in result_ids {
            let mscore = if query_suggestion.len() == 1 {
                MatchScore {
                    words_present: 1,
                    distance: 1,
                }
            } else {
                // Collect, per token, the positions it occupies in this doc
                let token_positions: Vec<Vec<u32>> = query_suggestion
                    .iter()
                    .map(|(_, leaf)| {
                        leaf.doc_index(doc_id)
                            .map(|doc_index| leaf.positions(doc_index))
                            .unwrap_or_default()
                    })
                    .collect();
                match_score(&token_positions)
            };

            let doc_score = self.doc_scores.get(&doc_id).copied().ok_or_else(|| {
                SepiaError::Internal(format!("missing static score for document {}", doc_id))
            })?;

            // High 32 bits: coverage and proximity; low 32 bits: static score
            let final_score = ((mscore.words_present as u64 * 32
                + (MAX_SEARCH_TOKENS - mscore.distance) as u64)
                << 32)
                + doc_score as u64;

            topster.add(doc_id as u64, final_score);
        }

        Ok(())
    }

    fn log_leaves(&self, cost: u8, token: &str, leaves: &[(&str, &Postings)]) {
        for (candidate, postings) in leaves {
            debug!(
                token,
                cost,
                candidate,
                frequency = postings.doc_frequency(),
                max_score = postings.max_score(),
                "fuzzy candidate"
            );
        }
    }
}

/// Decode the `n`-th leaf combination, smallest posting list first
fn next_suggestion<'a>(
    token_leaves: &[Vec<(&'a str, &'a Postings)>],
    n: i64,
) -> Vec<(&'a str, &'a Postings)> {
    let mut query_suggestion = Vec::with_capacity(token_leaves.len());
    let mut rem = n;
    for leaves in token_leaves.iter().rev() {
        let radix = leaves.len() as i64;
        query_suggestion.push(leaves[(rem % radix) as usize]);
        rem /= radix;
    }
    query_suggestion.reverse();

    // Ascending by matched documents for cheaper intersection
    query_suggestion.sort_by_key(|(_, leaf)| leaf.doc_frequency());
    query_suggestion
}

/// Scalar sorted-merge intersection of two ascending id lists
fn intersect_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn memory_collection() -> Collection {
        Collection::with_store(Box::new(MemoryStore::new()), Config::default())
    }

    fn ids_of(results: &[Value]) -> Vec<String> {
        results
            .iter()
            .map(|doc| doc["id"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_add_assigns_sequence_id_when_absent() {
        let mut collection = memory_collection();
        let id = collection
            .add(r#"{"title":"hello world","points":1}"#)
            .unwrap();
        assert_eq!(id, "1");

        let id = collection.add(r#"{"title":"more","points":1}"#).unwrap();
        assert_eq!(id, "2");
        assert_eq!(collection.num_documents(), 2);
    }

    #[test]
    fn test_add_rejects_bad_documents_without_side_effects() {
        let mut collection = memory_collection();
        assert!(collection.add(r#"{"points":1}"#).is_err());
        assert!(collection.add("garbage").is_err());
        assert_eq!(collection.num_documents(), 0);
        assert!(collection.term_index().is_empty());
    }

    #[test]
    fn test_duplicate_id_replaces_previous_document() {
        let mut collection = memory_collection();
        collection
            .add(r#"{"id":"a","title":"old words","points":1}"#)
            .unwrap();
        collection
            .add(r#"{"id":"a","title":"new words","points":2}"#)
            .unwrap();

        assert_eq!(collection.num_documents(), 1);
        // The old title's tokens are gone, the new ones searchable
        let results = collection.search(&SearchRequest::new("old")).unwrap();
        assert!(results.is_empty());
        let results = collection.search(&SearchRequest::new("new")).unwrap();
        assert_eq!(ids_of(&results), vec!["a"]);
    }

    #[test]
    fn test_auto_assigned_id_collision_replaces_previous_document() {
        let mut collection = memory_collection();
        // Explicit id "2" occupies the decimal form of a future sequence id
        collection
            .add(r#"{"id":"2","title":"first entry","points":1}"#)
            .unwrap();
        // The next add mints sequence id 2 and auto-assigns id "2"
        let id = collection
            .add(r#"{"title":"second entry","points":1}"#)
            .unwrap();
        assert_eq!(id, "2");

        assert_eq!(collection.num_documents(), 1);
        let results = collection.search(&SearchRequest::new("first")).unwrap();
        assert!(results.is_empty());
        let results = collection.search(&SearchRequest::new("second")).unwrap();
        assert_eq!(ids_of(&results), vec!["2"]);
        // No postings survive from the replaced document
        assert_eq!(
            collection.term_index().get("entry").map(|p| p.doc_frequency()),
            Some(1)
        );
    }

    #[test]
    fn test_remove_unknown_id_is_not_found() {
        let mut collection = memory_collection();
        let err = collection.remove("ghost").unwrap_err();
        assert!(matches!(err, SepiaError::NotFound(_)));
    }

    #[test]
    fn test_remove_handles_repeated_title_tokens() {
        let mut collection = memory_collection();
        collection
            .add(r#"{"id":"r","title":"tuna tuna tuna","points":0}"#)
            .unwrap();
        collection.remove("r").unwrap();

        assert_eq!(collection.num_documents(), 0);
        assert!(collection.term_index().is_empty());
    }

    #[test]
    fn test_search_empty_query_returns_nothing() {
        let mut collection = memory_collection();
        collection.add(r#"{"title":"something","points":0}"#).unwrap();
        let results = collection.search(&SearchRequest::new("")).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_caps_results() {
        let mut collection = memory_collection();
        for i in 0..8 {
            collection
                .add(&format!(r#"{{"title":"shared token","points":{}}}"#, i))
                .unwrap();
        }
        let results = collection
            .search(&SearchRequest::new("shared").with_num_results(3))
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_num_typos_is_clamped() {
        let mut collection = memory_collection();
        collection
            .add(r#"{"id":"c","title":"clamp","points":0}"#)
            .unwrap();
        // 200 typos clamps to 2: "clxxp" is 2 edits from "clamp"
        let results = collection
            .search(&SearchRequest::new("clxxp").with_num_typos(200))
            .unwrap();
        assert_eq!(ids_of(&results), vec!["c"]);
    }

    #[test]
    fn test_intersect_sorted() {
        assert_eq!(intersect_sorted(&[1, 3, 5, 7], &[2, 3, 7, 9]), vec![3, 7]);
        assert_eq!(intersect_sorted(&[], &[1, 2]), Vec::<u32>::new());
        assert_eq!(intersect_sorted(&[4], &[4]), vec![4]);
    }

    #[test]
    fn test_next_suggestion_orders_by_frequency() {
        let mut big = Postings::new();
        for seq_id in 1..=3 {
            big.append(&DocPosting {
                seq_id,
                score: 0,
                positions: vec![0],
            });
        }
        let mut small = Postings::new();
        small.append(&DocPosting {
            seq_id: 2,
            score: 0,
            positions: vec![1],
        });

        let token_leaves = vec![vec![("big", &big)], vec![("small", &small)]];
        let suggestion = next_suggestion(&token_leaves, 0);
        assert_eq!(suggestion[0].0, "small");
        assert_eq!(suggestion[1].0, "big");
    }
}
