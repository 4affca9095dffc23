//! Core pipeline: report options, prompt composition, conversation memory,
//! generation, presentation and exports.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod conversation;
pub mod error;
pub mod export;
mod model_client;
pub mod present;
pub mod prompt;
pub mod report;
mod session;

pub use model_client::{GenerationClient, GenerationResult};
pub use session::{ActionOutcome, Session, SessionBuilder, deliver};
