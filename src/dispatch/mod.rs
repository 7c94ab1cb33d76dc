//! Command dispatch for chat bots.
//!
//! Inbound messages are matched against registered triggers, guarded so an
//! author runs one command per channel at a time, validated by middleware,
//! completed by interactive argument prompts, and executed. Every step is
//! reported on a lifecycle event stream. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Settings in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

pub use config::{ConfigError, DispatcherConfig};
pub use services::{DispatchError, DispatchResult, Dispatcher, DispatcherBuilder, LoadSummary};

#[cfg(test)]
mod tests;
