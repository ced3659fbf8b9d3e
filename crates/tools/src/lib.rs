//! Command line functionality that is shared between the tools.
#![forbid(unsafe_code)]

pub mod verbosity;
mod version;

pub use verbosity::VerbosityFlag;
pub use version::*;
