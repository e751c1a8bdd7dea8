//! Dockerfile parser module.
//!
//! Provides:
//! - `preprocess` - text normalisation (continuations, comments, ENV substitution)
//! - `directive` - typed directive model
//! - `dockerfile` - nom-based parser implementation

pub mod directive;
pub mod dockerfile;
pub mod preprocess;

pub use directive::*;
pub use dockerfile::parse_dockerfile;
pub use preprocess::normalize;
