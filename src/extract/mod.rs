//! Cache extraction
//!
//! Renders a Dancefile per cache source, builds it, and streams the
//! copied cache out of a container into the working directory.

pub mod batch;
pub mod pipeline;
pub mod progress;
pub mod template;

pub use batch::{extract_caches, BatchOutcome};
pub use pipeline::{ExtractSettings, Extractor, STAGING_DIR_NAME};
pub use progress::{ProgressSink, Stage, TracingProgress};
pub use template::{render, BUILDSTAMP_NAME, DANCEFILE_NAME};
