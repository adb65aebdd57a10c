//! Output formatting
//!
//! Every command prints through [`Formatter`], which switches between
//! human-readable text and JSON.

mod formatter;

pub use formatter::{Formatter, Tone};

/// Output settings taken from the global flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Print JSON instead of text
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress everything except errors
    pub quiet: bool,
}
