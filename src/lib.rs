//! Bookmark extraction, normalization and set-algebra comparison.
//!
//! Layers:
//! - domain: pure types, configuration, errors and ports
//! - usecase: collection building, comparison engine, dedup, report model, events
//! - infrastructure: parsers, normalizer rules, file adapters, renderers
//! - interface: CLI wiring

pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod usecase;
