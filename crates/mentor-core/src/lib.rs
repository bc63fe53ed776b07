//! Core types, traits and the assignment service for the Mentor mapping store.
//!
//! This crate is free of database and file I/O. Storage backends implement
//! the traits in [`repository`]; callers drive [`service::AssignmentStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod faculty;
pub mod fallback;
pub mod mapping;
pub mod repository;
pub mod service;
pub mod student;

pub use error::{Error, Result};
pub use fallback::{Fallback, FallbackError};
pub use service::AssignmentStore;
