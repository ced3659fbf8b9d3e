//! Utility types and functions for the Safra determinization toolset.
//!
//! Forbid unsafe code in this crate.
#![forbid(unsafe_code)]

mod error;
mod indexed_set;
mod random_test;
mod tagged_index;
mod test_logger;
mod timing;

pub use error::*;
pub use indexed_set::*;
pub use random_test::*;
pub use tagged_index::*;
pub use test_logger::*;
pub use timing::*;
