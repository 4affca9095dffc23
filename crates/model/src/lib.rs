//! An abstraction layer for search-grounded LLM providers.
//!
//! This crate establishes a unified protocol for the research pipeline to
//! talk to a hosted model, so that the pipeline can switch between
//! providers (or a local fake one) without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod grounding;
mod provider;
mod request;
mod response;

pub use error::*;
pub use grounding::*;
pub use provider::*;
pub use request::*;
pub use response::*;
