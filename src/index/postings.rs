//! Per-token posting data.
//!
//! A leaf holds three parallel compressed sequences: `ids` (ascending
//! document ids), `offset_index` (for each id, where that document's
//! positions start in `offsets`), and `offsets` (every document's title
//! positions, concatenated in id order). `max_score` tracks the best static
//! score ever indexed under the token and is advisory only; it is not
//! recomputed on removal.

use crate::index::intseq::IntSeq;
use crate::models::SeqId;

/// One document's contribution to a token's postings
#[derive(Clone, Debug)]
pub struct DocPosting {
    pub seq_id: SeqId,
    pub score: u32,
    /// Ascending 0-based word positions of the token in the title
    pub positions: Vec<u32>,
}

/// Posting leaf for one indexed token
#[derive(Clone, Debug, Default)]
pub struct Postings {
    ids: IntSeq,
    offset_index: IntSeq,
    offsets: IntSeq,
    max_score: u32,
}

impl Postings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document's positions
    ///
    /// Document ids are assigned monotonically, so a new record always lands
    /// past the current tail and `ids` stays strictly ascending.
    pub fn append(&mut self, doc: &DocPosting) {
        debug_assert!(
            self.ids.is_empty() || self.ids.at(self.ids.len() - 1) < doc.seq_id,
            "posting append out of order"
        );
        self.ids.push(doc.seq_id);
        self.offset_index.push(self.offsets.len() as u32);
        for &position in &doc.positions {
            self.offsets.push(position);
        }
        self.max_score = self.max_score.max(doc.score);
    }

    /// Number of documents containing the token
    pub fn doc_frequency(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Best static score among documents ever indexed under this token
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// The ascending document id sequence
    pub fn ids(&self) -> &IntSeq {
        &self.ids
    }

    /// Position of `seq_id` within `ids`, if present
    pub fn doc_index(&self, seq_id: SeqId) -> Option<usize> {
        self.ids.index_of(seq_id)
    }

    /// The title positions recorded for the document at `doc_index`
    pub fn positions(&self, doc_index: usize) -> Vec<u32> {
        let start = self.offset_index.at(doc_index) as usize;
        let end = if doc_index + 1 == self.ids.len() {
            self.offsets.len()
        } else {
            self.offset_index.at(doc_index + 1) as usize
        };
        self.offsets.range(start, end)
    }

    /// Remove a document's id, positions, and index entry
    ///
    /// Returns false when `seq_id` is not in this leaf, leaving it untouched.
    pub fn remove_doc(&mut self, seq_id: SeqId) -> bool {
        let Some(doc_index) = self.ids.index_of(seq_id) else {
            return false;
        };

        let start = self.offset_index.at(doc_index) as usize;
        let end = if doc_index + 1 == self.ids.len() {
            self.offsets.len()
        } else {
            self.offset_index.at(doc_index + 1) as usize
        };

        remove_and_shift_offset_index(&mut self.offset_index, &[doc_index]);
        self.offsets.remove_range(start, end);
        self.ids.remove_value_sorted(seq_id);
        true
    }
}

/// Drop the given entries from an offset index, shifting survivors left by
/// the total span of positions removed before them.
///
/// `indices` must be sorted ascending. The span of the last entry runs to
/// the end of the offsets sequence, so removing it shifts nothing.
fn remove_and_shift_offset_index(offset_index: &mut IntSeq, indices: &[usize]) {
    let values = offset_index.to_vec();
    let mut rebuilt = Vec::with_capacity(values.len());
    let mut removed = indices.iter().peekable();
    let mut shift = 0u32;

    for (index, &value) in values.iter().enumerate() {
        if removed.peek() == Some(&&index) {
            removed.next();
            if index + 1 < values.len() {
                shift += values[index + 1] - value;
            }
        } else {
            rebuilt.push(value - shift);
        }
    }

    offset_index.load(&rebuilt);
}
