use std::fmt;

use log::debug;
use log::info;

use safra_io::TimeProgress;
use safra_utilities::IndexedSet;
use safra_utilities::TagIndex;

use crate::DeterminizeError;
use crate::DnaTree;
use crate::FormatPriority;
use crate::Nsa;
use crate::Priority;
use crate::SymbolIndex;

/// A unique type for the states of the deterministic automaton.
pub struct DnaStateTag;

/// The index of a state of the deterministic automaton.
pub type DnaStateIndex = TagIndex<usize, DnaStateTag>;

/// A transition `from -[symbol, priority]-> to` of the deterministic automaton.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DnaEdge {
    pub from: DnaStateIndex,
    pub symbol: SymbolIndex,
    pub to: DnaStateIndex,
    pub priority: Option<Priority>,
}

/// The deterministic automaton, whose states are the trees reachable from the
/// initial tree.
///
/// The initial tree is always state zero, the remaining states are ordered by
/// their label. Edges are ordered by their textual rendering, see [FormatEdge].
#[derive(Debug, Clone)]
pub struct Dna {
    trees: Vec<DnaTree>,
    labels: Vec<String>,
    edges: Vec<DnaEdge>,
    alphabet: Vec<String>,
}

impl Dna {
    /// Returns the index of the initial state.
    pub fn initial_state(&self) -> DnaStateIndex {
        DnaStateIndex::new(0)
    }

    pub fn num_of_states(&self) -> usize {
        self.trees.len()
    }

    pub fn num_of_transitions(&self) -> usize {
        self.edges.len()
    }

    /// Iterates over all states in order.
    pub fn iter_states(&self) -> impl Iterator<Item = DnaStateIndex> + use<> {
        (0..self.num_of_states()).map(DnaStateIndex::new)
    }

    /// Returns the trees of all states in order.
    pub fn states(&self) -> &[DnaTree] {
        &self.trees
    }

    /// Returns the tree of the given state.
    pub fn tree(&self, state: DnaStateIndex) -> &DnaTree {
        &self.trees[*state]
    }

    /// Returns the label of the given state, which is the rendering of its tree.
    pub fn label(&self, state: DnaStateIndex) -> &str {
        &self.labels[*state]
    }

    /// Returns all edges.
    pub fn edges(&self) -> &[DnaEdge] {
        &self.edges
    }

    /// Iterates over the outgoing edges of the given state.
    pub fn outgoing_edges(&self, state: DnaStateIndex) -> impl Iterator<Item = &DnaEdge> + '_ {
        self.edges.iter().filter(move |edge| edge.from == state)
    }

    /// Returns the alphabet, which is shared with the nondeterministic automaton.
    pub fn alphabet(&self) -> &[String] {
        &self.alphabet
    }

    /// Returns the name of the given symbol.
    pub fn symbol_name(&self, symbol: SymbolIndex) -> &str {
        &self.alphabet[*symbol]
    }
}

/// Formats an edge as `Q<from> -> Q<to> [label="<symbol>[<priority>]"]`.
pub struct FormatEdge<'a> {
    pub dna: &'a Dna,
    pub edge: &'a DnaEdge,
}

impl fmt::Display for FormatEdge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q{} -> Q{} [label=\"{}[{}]\"]",
            self.edge.from,
            self.edge.to,
            self.dna.symbol_name(self.edge.symbol),
            FormatPriority(self.edge.priority)
        )
    }
}

/// Computes the deterministic automaton by exploring all trees that are
/// reachable from the initial tree, applying every symbol of the alphabet to
/// every discovered tree.
pub fn determinize(nsa: &Nsa) -> Result<Dna, DeterminizeError> {
    let mut discovered: IndexedSet<DnaTree> = IndexedSet::new();
    let mut edges = Vec::new();

    let initial = DnaTree::initial(nsa);
    let (initial_index, _) = discovered.insert(initial.clone());
    let mut working = vec![(initial_index, initial)];

    let mut progress = TimeProgress::new(
        |(explored, discovered): (usize, usize)| {
            info!("Explored {explored} trees, discovered {discovered} trees");
        },
        1,
    );

    let mut explored = 0;
    while let Some((index, tree)) = working.pop() {
        for symbol in nsa.iter_symbols() {
            let transition = tree.transition_index(nsa, symbol)?;
            let (to, inserted) = discovered.insert(transition.tree.clone());

            edges.push(DnaEdge {
                from: DnaStateIndex::new(*index),
                symbol,
                to: DnaStateIndex::new(*to),
                priority: transition.priority,
            });

            if inserted {
                working.push((to, transition.tree));
            }
        }

        explored += 1;
        progress.print((explored, discovered.len()));
    }

    debug!("Exploration finished, ordering the states by their label");

    // The initial tree keeps index zero, the others are ordered by label.
    let trees = discovered.into_vec();
    let labels: Vec<String> = trees.iter().map(|tree| tree.to_string()).collect();

    let mut order: Vec<usize> = (1..trees.len()).collect();
    order.sort_by(|left, right| labels[*left].cmp(&labels[*right]));
    order.insert(0, *initial_index);

    let mut position = vec![DnaStateIndex::new(0); trees.len()];
    for (sorted, state) in order.iter().enumerate() {
        position[*state] = DnaStateIndex::new(sorted);
    }

    let mut trees: Vec<Option<DnaTree>> = trees.into_iter().map(Some).collect();
    let mut dna = Dna {
        trees: order.iter().filter_map(|state| trees[*state].take()).collect(),
        labels: order.iter().map(|state| labels[*state].clone()).collect(),
        edges: Vec::new(),
        alphabet: nsa.alphabet().to_vec(),
    };

    let mut rendered: Vec<(String, DnaEdge)> = edges
        .into_iter()
        .map(|edge| {
            let edge = DnaEdge {
                from: position[*edge.from],
                to: position[*edge.to],
                ..edge
            };
            (FormatEdge { dna: &dna, edge: &edge }.to_string(), edge)
        })
        .collect();
    rendered.sort_by(|left, right| left.0.cmp(&right.0));
    dna.edges = rendered.into_iter().map(|(_, edge)| edge).collect();

    info!(
        "Determinized {} states into {} states and {} transitions",
        nsa.num_of_states(),
        dna.num_of_states(),
        dna.num_of_transitions()
    );

    Ok(dna)
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::NsaBuilder;
    use crate::SetColor;

    #[test]
    fn test_determinize_single_step() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        let s1 = builder.add_state(false);
        builder.add_transition(s0, "a", s1);
        builder.add_set(SetColor::Red, vec![]);
        builder.add_set(SetColor::Green, vec![s1]);
        let nsa = builder.finish().unwrap();

        let dna = determinize(&nsa).unwrap();

        assert_eq!(dna.num_of_states(), 3);
        assert_eq!(dna.label(DnaStateIndex::new(0)), "[0 0 0],[0 $],[0]");
        assert_eq!(dna.label(DnaStateIndex::new(1)), "[0 0 0],[$ $],[0]");
        assert_eq!(dna.label(DnaStateIndex::new(2)), "[0 0 0],[$ 0],[0]");

        let edges: Vec<String> = dna
            .edges()
            .iter()
            .map(|edge| FormatEdge { dna: &dna, edge }.to_string())
            .collect();
        assert_eq!(
            edges,
            vec![
                "Q0 -> Q2 [label=\"a[1]\"]",
                "Q1 -> Q1 [label=\"a[0]\"]",
                "Q2 -> Q1 [label=\"a[0]\"]",
            ]
        );
    }

    #[test]
    fn test_determinize_self_loop() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        builder.add_transition(s0, "a", s0);
        builder.add_set(SetColor::Green, vec![s0]);
        let nsa = builder.finish().unwrap();

        let dna = determinize(&nsa).unwrap();

        assert_eq!(dna.num_of_states(), 1);
        assert_eq!(dna.label(dna.initial_state()), "[0],[0],[0]");
        assert_eq!(
            dna.edges(),
            &[DnaEdge {
                from: DnaStateIndex::new(0),
                symbol: SymbolIndex::new(0),
                to: DnaStateIndex::new(0),
                priority: Some(Priority::new(1)),
            }]
        );
    }

    #[test]
    fn test_determinize_empty_green_set_exceeds_capacity() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        builder.add_transition(s0, "a", s0);
        builder.add_set(SetColor::Green, vec![]);
        let nsa = builder.finish().unwrap();

        // The templar below the root keeps a phi child, and the next main child
        // of the root collides with it in slot n'.
        let result = determinize(&nsa);
        assert!(matches!(
            result,
            Err(DeterminizeError::CapacityExceeded { tree, slot: 2, capacity: 6, .. }) if tree == "[0 1],[2],[0 + f]"
        ));
    }

    #[test]
    fn test_determinize_complete() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        let s1 = builder.add_state(false);
        builder.add_transition(s0, "a", s0);
        builder.add_transition(s0, "a", s1);
        builder.add_transition(s1, "b", s1);
        builder.add_set(SetColor::Green, vec![s1]);
        let nsa = builder.finish().unwrap();

        let dna = determinize(&nsa).unwrap();

        // Every state has exactly one successor per symbol.
        for state in dna.iter_states() {
            for symbol in nsa.iter_symbols() {
                assert_eq!(
                    dna.outgoing_edges(state).filter(|edge| edge.symbol == symbol).count(),
                    1
                );
            }
        }
    }
}
