//! Core domain types and logic.

pub mod candidate;
pub mod config;
pub mod config_validation;
pub mod decision;
pub mod entry;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod reason_log;
pub mod regime;
pub mod scan;
pub mod sizing;
pub mod snapshot;
pub mod universe;

pub use decision::{Decision, Verdict};
pub use pipeline::{evaluate, DecisionEngine};
