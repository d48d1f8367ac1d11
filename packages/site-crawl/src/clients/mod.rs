//! Upstream client implementations.
//!
//! - `FirecrawlClient` - Firecrawl HTTP API
//! - `MockBackend` (in [`crate::testing`]) - scripted responses for tests

mod firecrawl;

pub use firecrawl::FirecrawlClient;
