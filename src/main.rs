//! Binary entrypoint.
//!
//! The library is split into layers:
//! - domain: pure types, rules configuration and ports
//! - usecase: collection building, set algebra, dedup, reports and progress events
//! - infrastructure: parsers, normalizer, serde and async file I/O, renderers
//! - interface: CLI wiring

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    bookmark_compare::interface::cli::run().await
}
