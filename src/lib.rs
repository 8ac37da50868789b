//! GridNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod components;
pub mod config;
pub mod discovery;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod identity;
pub mod pins;
pub mod protocol;
pub mod transport;

pub use error::{Error, Result};
