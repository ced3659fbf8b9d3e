use std::fmt;

use itertools::Itertools;
use log::trace;

use safra_utilities::TagIndex;

use crate::Annotation;
use crate::AnnotationIndex;
use crate::DeterminizeError;
use crate::Nsa;
use crate::StateIndex;
use crate::SymbolIndex;
use crate::working_tree::WorkingTree;

/// A unique type for the nodes of a tree.
pub struct NodeTag;

/// A unique type for the priorities emitted by transitions.
pub struct PriorityTag;

/// The index of a node in a tree, the root has index zero.
pub type NodeIndex = TagIndex<usize, NodeTag>;

/// The priority `k` of a transition, `2i` signals that node `i` became empty
/// and `2i + 1` that node `i` became colored again (or is a phi node).
pub type Priority = TagIndex<usize, PriorityTag>;

/// The root of every tree.
pub const ROOT: NodeIndex = NodeIndex::new(0);

/// A state of the deterministic automaton: a tree of annotated nodes in which
/// every reachable state of the nondeterministic automaton is owned by exactly
/// one node.
///
/// The tree is stored as compacted arrays, live nodes are numbered densely from
/// zero and every parent has a smaller index than its children. Trees are
/// immutable values, equality and hashing are structural.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct DnaTree {
    /// The parent of every node, the entry of the root is unused.
    parent: Vec<NodeIndex>,

    annotation: Vec<Annotation>,

    /// For every state the node that owns it, if any.
    owner: Vec<Option<NodeIndex>>,

    /// The bound on live nodes of the automaton, determines the width of the label.
    n_prime: usize,
}

/// The result of a transition on a tree.
#[derive(Clone, Debug)]
pub struct DnaTransition {
    pub tree: DnaTree,
    pub priority: Option<Priority>,
}

impl DnaTree {
    /// Returns the initial tree of the automaton: a root annotated with the
    /// first color that owns all start states.
    pub fn initial(nsa: &Nsa) -> DnaTree {
        let owner = nsa
            .start_states()
            .iter()
            .map(|start| if *start { Some(ROOT) } else { None })
            .collect();

        DnaTree {
            parent: vec![ROOT],
            annotation: vec![Annotation::Colored(AnnotationIndex::new(0))],
            owner,
            n_prime: nsa.n_prime(),
        }
    }

    /// Creates a tree from compacted arrays.
    pub(crate) fn from_parts(
        parent: Vec<NodeIndex>,
        annotation: Vec<Annotation>,
        owner: Vec<Option<NodeIndex>>,
        n_prime: usize,
    ) -> DnaTree {
        debug_assert_eq!(parent.len(), annotation.len(), "Every node has a parent and an annotation");
        debug_assert!(
            parent.iter().enumerate().skip(1).all(|(node, parent)| *parent < node),
            "Parents must precede their children"
        );
        debug_assert!(
            owner.iter().flatten().all(|node| **node < parent.len()),
            "Every owner must be a live node"
        );

        DnaTree {
            parent,
            annotation,
            owner,
            n_prime,
        }
    }

    /// Returns the number of live nodes.
    pub fn num_of_nodes(&self) -> usize {
        self.annotation.len()
    }

    /// Iterates over the live nodes in ascending order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = NodeIndex> + use<> {
        (0..self.num_of_nodes()).map(NodeIndex::new)
    }

    /// Returns the parent of the given node, or None for the root.
    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        if node == ROOT { None } else { Some(self.parent[*node]) }
    }

    /// Returns the annotation of the given node.
    pub fn annotation(&self, node: NodeIndex) -> Annotation {
        self.annotation[*node]
    }

    /// Returns the node that owns the given state, if any.
    pub fn owner(&self, state: StateIndex) -> Option<NodeIndex> {
        self.owner[*state]
    }

    /// Iterates over the owned states together with their owner.
    pub fn iter_owners(&self) -> impl Iterator<Item = (StateIndex, NodeIndex)> + '_ {
        self.owner
            .iter()
            .enumerate()
            .filter_map(|(state, owner)| owner.map(|owner| (StateIndex::new(state), owner)))
    }

    /// Computes the successor tree and priority for the given symbol.
    ///
    /// Fails when the symbol does not occur in the alphabet of the automaton.
    pub fn transition(&self, nsa: &Nsa, symbol: &str) -> Result<DnaTransition, DeterminizeError> {
        let symbol = nsa.symbol_index(symbol)?;
        self.transition_index(nsa, symbol)
    }

    /// Computes the successor tree and priority for the given symbol index.
    pub fn transition_index(&self, nsa: &Nsa, symbol: SymbolIndex) -> Result<DnaTransition, DeterminizeError> {
        debug_assert_eq!(
            self.owner.len(),
            nsa.num_of_states(),
            "The tree does not belong to the given automaton"
        );

        let mut working = WorkingTree::new(nsa, self, symbol)?;
        working.spawn(ROOT)?;
        working.fix_seniority();
        let priority = working.fix_uniqueness();
        let tree = working.pack();

        trace!(
            "{self} -[{}]-> {tree} with priority {}",
            nsa.symbol_name(symbol)?,
            FormatPriority(priority)
        );

        Ok(DnaTransition { tree, priority })
    }
}

/// The canonical label of the tree, consisting of three bracketed segments:
/// the parents of the nodes `2..n'` (the root and node 1 always have parent
/// zero), the owner of every state (`$` when unowned), and the annotations of
/// the live nodes.
impl fmt::Display for DnaTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Trees that outgrow n' keep all their parents, so the label stays injective.
        write!(f, "[0")?;
        for node in 2..self.n_prime.max(self.num_of_nodes()) {
            write!(f, " {}", self.parent.get(node).map_or(0, |parent| **parent))?;
        }

        write!(
            f,
            "],[{}],[{}]",
            self.owner.iter().format_with(" ", |owner, fmt| match owner {
                Some(node) => fmt(node),
                None => fmt(&"$"),
            }),
            self.annotation.iter().format(" ")
        )
    }
}

/// Formats an optional priority, an undefined priority is printed as `-`.
pub struct FormatPriority(pub Option<Priority>);

impl fmt::Display for FormatPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(priority) => write!(f, "{priority}"),
            None => write!(f, "-"),
        }
    }
}
