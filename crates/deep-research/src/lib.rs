//! A deep research assistant backed by Gemini with Google Search grounding.
//!
//! The crate includes a CLI tool for the terminal. The configuration
//! loading and the widget handling are also usable as a library.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod config;
#[cfg(feature = "cli")]
pub mod terminal;
pub mod widget;

/// Re-exports of [`deep_research_core`] crate.
pub mod core {
    pub use deep_research_core::*;
}
