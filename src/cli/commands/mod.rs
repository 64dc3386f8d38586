//! CLI command implementations

pub mod completions;
pub mod config;
pub mod extract;
pub mod render;

pub use completions::execute as completions;
pub use config::execute as config;
pub use extract::execute as extract;
pub use render::execute as render;
