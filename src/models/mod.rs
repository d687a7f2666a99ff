pub mod document;
pub mod search;

pub use document::{Document, SeqId};
pub use search::{SearchRequest, TokenOrder};
