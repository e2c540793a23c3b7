//! Usecase layer: collection building, comparison engine, reports and workflows.

pub mod collection;
pub mod compare;
pub mod dedup;
pub mod event;
pub mod report;
pub mod run;
pub mod stats;
pub mod validate;
