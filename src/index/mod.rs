//! In-memory index primitives: compressed posting data, fuzzy token lookup,
//! proximity scoring, and top-K selection.

mod intseq;
mod match_score;
mod postings;
mod term_index;
mod topster;

pub use intseq::{IntSeq, IntSeqIter};
pub use match_score::{match_score, MatchScore};
pub use postings::{DocPosting, Postings};
pub use term_index::TermIndex;
pub use topster::Topster;
