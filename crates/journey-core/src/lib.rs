//! Core types and algorithms for the keychain journey tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::JourneyStore`]; the HTTP layer and the
//! terminal client both validate input through the same [`validate`] rules.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod blessing;
pub mod chain;
pub mod error;
pub mod event;
pub mod flow;
pub mod keychain;
pub mod memory;
pub mod pii;
pub mod prompt;
pub mod ratelimit;
pub mod reaction;
pub mod store;
pub mod validate;

pub use error::{Error, ErrorCode, Result, ValidationError};
