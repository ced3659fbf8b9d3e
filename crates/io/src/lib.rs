//! Utility types and functions related to I/O for the Safra determinization toolset.
//!
//! Forbid unsafe code in this crate.
#![forbid(unsafe_code)]

mod line_iterator;
mod progress;

pub use line_iterator::*;
pub use progress::*;
