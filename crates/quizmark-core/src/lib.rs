//! quizmark-core: Question classification, grading and progress tracking.
//!
//! This crate defines the data model, the seams to the LLM and content
//! backends, and the grading, progress and session logic the rest of
//! quizmark builds on.

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod grading;
pub mod model;
pub mod oracle;
pub mod progress;
pub mod session;
pub mod statistics;
pub mod store;
pub mod traits;

#[cfg(test)]
mod testing;
