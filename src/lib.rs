//! cache-dance - BuildKit mount cache extraction
//!
//! Copies the contents of `RUN --mount=type=cache` caches out of BuildKit
//! and onto the host so CI can persist them between runs.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod orchestration;

pub use error::{DanceError, DanceResult};
