//! Cache sources and their mount options
//!
//! Everything in here is pure value handling: validating source names,
//! formatting BuildKit mount arguments and resolving configuration into
//! the ordered map the extraction pipeline walks.

pub mod map;
pub mod options;
pub mod resolve;
pub mod source;

pub use map::CacheMap;
pub use options::{CacheOptions, CacheSpec, MountOptions, Sharing};
pub use resolve::{resolve, Overrides, ResolvedOptions};
pub use source::CacheSource;
