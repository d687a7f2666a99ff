//! Proximity scoring for one document.
//!
//! Given the positions at which each query token appears in a document's
//! title, the score is the tightest window containing one occurrence of
//! every matched token. A title "red blue green" beats "red green blue" for
//! the query "red blue" because its window spans 1 word instead of 2.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::config::MAX_SEARCH_TOKENS;

/// Per-document proximity summary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchScore {
    /// How many query tokens had at least one position in the document
    pub words_present: u16,
    /// Minimum window span covering one position per matched token,
    /// clamped to [`MAX_SEARCH_TOKENS`]
    pub distance: u16,
}

/// Compute the proximity summary for one document
///
/// `token_positions` holds one ascending position list per query token.
/// Empty lists count as absent tokens; they reduce `words_present` and are
/// excluded from the window instead of poisoning it.
pub fn match_score(token_positions: &[Vec<u32>]) -> MatchScore {
    let lists: Vec<&Vec<u32>> = token_positions
        .iter()
        .filter(|positions| !positions.is_empty())
        .collect();

    let words_present = lists.len() as u16;
    if lists.is_empty() {
        return MatchScore {
            words_present: 0,
            distance: MAX_SEARCH_TOKENS,
        };
    }

    // Smallest-range sweep: keep one cursor per list in a min-heap, pop the
    // minimum, measure the current span, advance that cursor. Once any list
    // is exhausted no tighter window exists.
    let mut heap: BinaryHeap<Reverse<(u32, usize, usize)>> = BinaryHeap::with_capacity(lists.len());
    let mut current_max = 0u32;
    for (list_index, positions) in lists.iter().enumerate() {
        let position = positions[0];
        heap.push(Reverse((position, list_index, 0)));
        current_max = current_max.max(position);
    }

    let mut best_span = u32::MAX;
    while let Some(Reverse((position, list_index, cursor))) = heap.pop() {
        best_span = best_span.min(current_max - position);
        let positions = lists[list_index];
        if cursor + 1 >= positions.len() {
            break;
        }
        let next = positions[cursor + 1];
        current_max = current_max.max(next);
        heap.push(Reverse((next, list_index, cursor + 1)));
    }

    MatchScore {
        words_present,
        distance: best_span.min(MAX_SEARCH_TOKENS as u32) as u16,
    }
}
