//! Core domain + application logic for the AniList planning bot.
//!
//! This crate is framework-agnostic. Telegram and AniList live behind ports
//! (traits) implemented in adapter crates.

pub mod anime;
pub mod audit;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod registry;
pub mod service;
pub mod source;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
