//! Core of the Matrix self bot.
//!
//! This crate is framework-agnostic. The Matrix client, the image codec and
//! external lookups live behind ports (traits) implemented here or in adapter
//! crates.

pub mod cache;
pub mod comics;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod domain;
pub mod emoji;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod media;
pub mod messaging;
pub mod probe;
pub mod ratelimit;
pub mod store;
pub mod text_macros;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
