//! Structured progress reporting for the extraction pipeline

use crate::cache::CacheSource;
use std::fmt;
use tracing::info;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Stamp,
    Generate,
    Build,
    ResetContainer,
    Materialize,
    Extract,
    Relocate,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stamp => "stamp",
            Self::Generate => "generate",
            Self::Build => "build",
            Self::ResetContainer => "reset-container",
            Self::Materialize => "materialize",
            Self::Extract => "extract",
            Self::Relocate => "relocate",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Receives operator-facing progress events
pub trait ProgressSink: Send + Sync {
    fn event(&self, stage: Stage, source: &CacheSource, detail: &str);
}

/// Emits progress as `tracing` events
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn event(&self, stage: Stage, source: &CacheSource, detail: &str) {
        info!(stage = %stage, source = %source, "{}", detail);
    }
}
