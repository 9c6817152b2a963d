//! Proxicalc Pipeline - the batch indexing engine
//!
//! Pulls documents page by page from a scroll over the source index, runs a
//! concurrent extraction task per page that turns numeric tokens into
//! proximity records, accumulates the records per language in a shared
//! buffer, and drains the buffer into per-(language, ambit) bulk destinations
//! whenever the chunk threshold is reached or the scroll ends.

pub mod buffer;
pub mod extract;
pub mod orchestrator;
pub mod record;
pub mod scroll;
pub mod tokenize;
pub mod uploader;

pub use buffer::ProximityBuffer;
pub use extract::Extractor;
pub use orchestrator::{ProximityPipeline, RunSummary};
pub use record::{Neighbor, ProximityRecord, Side};
pub use scroll::SourcePaginator;
pub use uploader::IndexerPool;
