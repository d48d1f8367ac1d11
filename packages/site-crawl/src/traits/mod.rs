//! Trait seams between orchestration and the outside world.
//!
//! The orchestrator only talks to upstream through [`CrawlBackend`] and to
//! persistence through [`RecordStore`], so either side can be swapped for a
//! mock in tests.

pub mod backend;
pub mod store;

pub use backend::CrawlBackend;
pub use store::RecordStore;
