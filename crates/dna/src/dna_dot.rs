use std::fmt;

use crate::Dna;
use crate::FormatEdge;

/// Helper to render a deterministic automaton as a complete Graphviz digraph,
/// using the same state and transition lines as [crate::write_dna].
pub struct DnaDot<'a> {
    pub dna: &'a Dna,
}

impl<'a> DnaDot<'a> {
    /// Creates a new DnaDot Display for the given automaton.
    pub fn new(dna: &'a Dna) -> Self {
        Self { dna }
    }
}

impl fmt::Display for DnaDot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph dna {{")?;
        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [shape=box, fontname=\"DejaVu Sans Mono\"];")?;
        writeln!(f, "  edge [fontname=\"DejaVu Sans\"];")?;

        for state in self.dna.iter_states() {
            writeln!(f, "\t\tQ{} [label=\"{}\"]", state, self.dna.label(state))?;
        }

        for edge in self.dna.edges() {
            writeln!(f, "\t\t\t\t{}", FormatEdge { dna: self.dna, edge })?;
        }

        writeln!(f, "  init [shape=point, width=0.05, label=\"\"];")?;
        writeln!(f, "  init -> Q{} [arrowsize=0.6];", self.dna.initial_state())?;
        writeln!(f, "}}")
    }
}
