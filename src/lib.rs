//! gatekeeper: rule-based trade decision engine.
//!
//! Regime, gates, candidate classification, entry triggers and position
//! sizing run in a fixed order and resolve to APPROVE, WAIT or REJECT with a
//! full reason log. Hexagonal architecture: domain logic in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
