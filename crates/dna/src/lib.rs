//!
//! Determinization of nondeterministic Streett automata (NSA) into
//! deterministic automata (DNA) whose states are annotated trees, following a
//! Safra style construction.
//!
//! The [DnaTree] is the canonical representation of a deterministic state, and
//! [determinize] enumerates all trees that are reachable from the initial one.
//!
//! This crate does not use unsafe code.

#![forbid(unsafe_code)]

mod annotation;
mod determinize;
mod dna_dot;
mod dna_tree;
mod error;
mod io_dna;
mod io_nsa;
mod nsa;
mod random_nsa;
mod working_tree;

pub use annotation::*;
pub use determinize::*;
pub use dna_dot::*;
pub use dna_tree::*;
pub use error::*;
pub use io_dna::*;
pub use io_nsa::*;
pub use nsa::*;
pub use random_nsa::*;
