//! Core types and trait definitions for the shift scheduling engine.
//!
//! This crate is deliberately free of file-format, HTTP and database
//! dependencies. All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod attendance;
pub mod error;
pub mod events;
pub mod notification;
pub mod people;
pub mod shift;
pub mod store;
pub mod ticket;
pub mod time;

pub use error::{Error, Result, StoreError};
