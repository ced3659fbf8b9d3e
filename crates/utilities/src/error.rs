use std::error::Error;

/// The error type that is returned at the boundaries of the toolset, for
/// example by the tools and the I/O functions.
///
/// Every library error (and plain strings) converts into it, so `?` can be
/// used uniformly.
pub type SafraError = Box<dyn Error + Send + Sync>;
