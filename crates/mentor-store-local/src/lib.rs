//! Local JSON cache for the Mentor mapping store.
//!
//! The whole cache is one JSON document, loaded at startup and rewritten on
//! every mutation. It is the fast, always-available half of a
//! [`mentor_core::Fallback`].

mod blob;
mod cache;

pub mod error;

pub use cache::LocalCache;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
