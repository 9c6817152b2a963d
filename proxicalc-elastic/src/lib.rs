//! Proxicalc Elastic - search backend client and bulk destination handles
//!
//! Talks to an Elasticsearch-compatible backend over HTTP: scroll-based
//! paginated reads on one side, batched `_bulk` writes with per-item
//! acknowledgment on the other. The [`SearchBackend`] trait is the seam the
//! pipeline (and its tests) work against.

pub mod backend;
pub mod bulk;
pub mod client;
pub mod types;

pub use backend::SearchBackend;
pub use bulk::{BulkIndexer, BulkStats};
pub use client::ElasticClient;
pub use types::*;
