//! Shared types, configuration, and error handling for my-reviews.
//!
//! This crate provides the foundation used by the reporter crates:
//! - [`ReviewsError`]: unified error type using `thiserror` and `miette`
//! - [`config`]: `arc` binary resolution, GitHub token lookup, link bases
//! - [`Palette`]: ANSI styling for terminal reports
//! - [`OutputFormat`]: text or JSON output

pub mod config;
mod error;
mod style;
mod types;

pub use config::{ArcBinary, LinkConfig};
pub use error::ReviewsError;
pub use style::Palette;
pub use types::OutputFormat;

/// A convenience `Result` type for report operations.
pub type Result<T> = std::result::Result<T, ReviewsError>;
