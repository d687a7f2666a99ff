//! Sepia: typo-tolerant full-text search over JSON documents.
//!
//! A collection indexes the `title` field of JSON documents into an
//! in-memory token index while persisting the documents themselves to an
//! on-disk key-value store. Searches tolerate per-token typos, optionally
//! match prefixes, and rank by token coverage, proximity of the matched
//! words, and each document's static score.
//!
//! # Example
//!
//! ```no_run
//! use sepia::{Collection, SearchRequest};
//!
//! # fn main() -> sepia::Result<()> {
//! let mut collection = Collection::open("./data")?;
//! collection.add(r#"{"id":"1","title":"fast fuzzy search","points":10}"#)?;
//!
//! let results = collection.search(&SearchRequest::new("fzzy search").with_num_typos(1))?;
//! assert_eq!(results[0]["id"], "1");
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod persistence;
pub mod tokenizer;

pub use collection::Collection;
pub use config::{Config, MAX_SEARCH_TOKENS};
pub use error::{Result, SepiaError};
pub use models::{Document, SearchRequest, SeqId, TokenOrder};
pub use persistence::{DocStore, MemoryStore, Store};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
