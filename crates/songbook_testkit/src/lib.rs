//! # Songbook Testkit
//!
//! Test utilities for the songbook sync engine.
//!
//! This crate provides:
//! - A [`TestServer`] over an in-memory or temporary file store with a
//!   manual clock, plus payload builders
//! - [`FlakyStore`], a store wrapper that fails on demand
//! - Property-based test generators using proptest
//! - Concurrent-writer stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use songbook_sync_protocol::EntityKind;
//! use songbook_testkit::prelude::*;
//!
//! let server = TestServer::memory();
//! let song = server.seed(EntityKind::Song, "s1", song("Amazing Grace"));
//! assert_eq!(song.id, "s1");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod flaky;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::flaky::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use flaky::*;
pub use generators::*;
pub use stress::*;
