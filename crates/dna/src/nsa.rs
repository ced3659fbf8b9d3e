use std::fmt;

use bitvec::bitvec;
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;
use log::debug;

use safra_utilities::IndexedSet;
use safra_utilities::TagIndex;

use crate::DeterminizeError;

/// A unique type for the states of the nondeterministic automaton.
pub struct StateTag;

/// A unique type for the alphabet symbols.
pub struct SymbolTag;

/// A unique type for the annotations, which index the red and green sets.
pub struct AnnotationTag;

/// The index of a state of the nondeterministic automaton.
pub type StateIndex = TagIndex<usize, StateTag>;

/// The index of a symbol in the (sorted) alphabet.
pub type SymbolIndex = TagIndex<usize, SymbolTag>;

/// The index of a red and green set pair.
pub type AnnotationIndex = TagIndex<usize, AnnotationTag>;

/// A set of states of the nondeterministic automaton, indexed by [StateIndex].
pub type StateSet = BitVec<usize, Lsb0>;

/// A set of annotations, indexed by [AnnotationIndex].
pub type AnnotationSet = BitVec<usize, Lsb0>;

/// The two families of sets that define the acceptance condition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SetColor {
    /// A forbidding set, states in it are removed from nodes that exclude its annotation.
    Red,
    /// An accepting set, filters the states of the main successor of a colored node.
    Green,
}

impl fmt::Display for SetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetColor::Red => write!(f, "R"),
            SetColor::Green => write!(f, "G"),
        }
    }
}

/// A nondeterministic automaton with a Streett-like acceptance condition given
/// by pairs of red (forbidding) and green (accepting) sets.
///
/// The alphabet is fixed at construction, and consists of exactly the symbols
/// that occur in the transition table in lexicographical order.
#[derive(Debug, Clone)]
pub struct Nsa {
    num_of_states: usize,
    start_states: StateSet,

    /// The sorted alphabet.
    alphabet: Vec<String>,

    /// For every symbol and state the list of successors.
    successors: Vec<Vec<Vec<StateIndex>>>,

    red_sets: Vec<StateSet>,
    green_sets: Vec<StateSet>,
}

impl Nsa {
    /// Returns the number of states.
    pub fn num_of_states(&self) -> usize {
        self.num_of_states
    }

    /// Returns the number of annotations, which is the number of green sets.
    pub fn num_of_annotations(&self) -> usize {
        self.green_sets.len()
    }

    /// Returns the number of transitions, counting every successor separately.
    pub fn num_of_transitions(&self) -> usize {
        self.successors
            .iter()
            .flat_map(|per_state| per_state.iter())
            .map(|successors| successors.len())
            .sum()
    }

    /// The bound `n * (annotations + 1)` on the number of live nodes in a tree.
    pub fn n_prime(&self) -> usize {
        self.num_of_states * (self.num_of_annotations() + 1)
    }

    /// The number of node slots that a tree can use during a transition, the
    /// spawn stage temporarily places nodes at offsets `n'` and `2n'`.
    pub fn capacity(&self) -> usize {
        3 * self.n_prime()
    }

    /// Returns the set of start states.
    pub fn start_states(&self) -> &StateSet {
        &self.start_states
    }

    /// Returns the sorted alphabet.
    pub fn alphabet(&self) -> &[String] {
        &self.alphabet
    }

    /// Iterates over all symbols of the alphabet.
    pub fn iter_symbols(&self) -> impl Iterator<Item = SymbolIndex> + use<> {
        (0..self.alphabet.len()).map(SymbolIndex::new)
    }

    /// Returns the index of the given symbol.
    pub fn symbol_index(&self, symbol: &str) -> Result<SymbolIndex, DeterminizeError> {
        self.alphabet
            .binary_search_by(|other| other.as_str().cmp(symbol))
            .map(SymbolIndex::new)
            .map_err(|_| DeterminizeError::UnknownSymbol(symbol.to_string()))
    }

    /// Returns the name of the given symbol.
    pub fn symbol_name(&self, symbol: SymbolIndex) -> Result<&str, DeterminizeError> {
        self.alphabet
            .get(*symbol)
            .map(String::as_str)
            .ok_or(DeterminizeError::SymbolOutOfRange {
                index: *symbol,
                num_of_symbols: self.alphabet.len(),
            })
    }

    /// Returns the green set of the given annotation.
    pub fn green_set(&self, annotation: AnnotationIndex) -> &StateSet {
        &self.green_sets[*annotation]
    }

    /// Returns the red set of the given annotation, if it has one. Annotations
    /// without a red set do not forbid any state.
    pub fn red_set(&self, annotation: AnnotationIndex) -> Option<&StateSet> {
        self.red_sets.get(*annotation)
    }

    /// Returns an empty set of states.
    pub fn empty_states(&self) -> StateSet {
        bitvec![usize, Lsb0; 0; self.num_of_states]
    }

    /// Returns an empty set of annotations.
    pub fn empty_annotations(&self) -> AnnotationSet {
        bitvec![usize, Lsb0; 0; self.num_of_annotations()]
    }

    /// Computes the union of the successors of all given states under the
    /// symbol, and removes every state that is in a red set of an excluded
    /// annotation.
    pub fn transition_function(
        &self,
        states: &StateSet,
        excluded: &AnnotationSet,
        symbol: SymbolIndex,
    ) -> Result<StateSet, DeterminizeError> {
        let successors = self
            .successors
            .get(*symbol)
            .ok_or(DeterminizeError::SymbolOutOfRange {
                index: *symbol,
                num_of_symbols: self.alphabet.len(),
            })?;

        let mut result = self.empty_states();
        for state in states.iter_ones() {
            for successor in &successors[state] {
                result.set(**successor, true);
            }
        }

        for annotation in excluded.iter_ones() {
            if let Some(red) = self.red_set(AnnotationIndex::new(annotation)) {
                for state in red.iter_ones() {
                    result.set(state, false);
                }
            }
        }

        Ok(result)
    }

    /// Removes all states that are not in the green set of the given annotation.
    pub fn retain_green(&self, states: &mut StateSet, annotation: AnnotationIndex) {
        let green = self.green_set(annotation);
        let rejected: Vec<usize> = states.iter_ones().filter(|state| !green[*state]).collect();
        for state in rejected {
            states.set(state, false);
        }
    }
}

/// Incrementally constructs a [Nsa], the number of states does not have to be
/// known in advance.
#[derive(Default)]
pub struct NsaBuilder {
    num_of_states: usize,
    start_states: Vec<StateIndex>,

    labels: IndexedSet<String>,
    transitions: Vec<(StateIndex, usize, StateIndex)>,

    red_sets: Vec<Vec<StateIndex>>,
    green_sets: Vec<Vec<StateIndex>>,
}

impl NsaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new state and returns its index, states are numbered in order of creation.
    pub fn add_state(&mut self, start: bool) -> StateIndex {
        let state = StateIndex::new(self.num_of_states);
        self.num_of_states += 1;

        if start {
            self.start_states.push(state);
        }

        state
    }

    /// Adds a transition `from -[symbol]-> to`.
    pub fn add_transition(&mut self, from: StateIndex, symbol: &str, to: StateIndex) {
        let (label, _) = self.labels.insert(symbol.to_string());
        self.transitions.push((from, *label, to));
    }

    /// Returns the number of sets of the given color added so far.
    pub fn num_of_sets(&self, color: SetColor) -> usize {
        match color {
            SetColor::Red => self.red_sets.len(),
            SetColor::Green => self.green_sets.len(),
        }
    }

    /// Inserts a set of the given color at position `index`, shifting the sets
    /// after it. The index must be at most [NsaBuilder::num_of_sets].
    pub fn insert_set(&mut self, color: SetColor, index: usize, states: Vec<StateIndex>) {
        let sets = match color {
            SetColor::Red => &mut self.red_sets,
            SetColor::Green => &mut self.green_sets,
        };

        assert!(
            index <= sets.len(),
            "Set {color}_{index} can only be inserted after {color}_{}",
            sets.len()
        );
        sets.insert(index, states);
    }

    /// Adds a set of the given color after the existing ones.
    pub fn add_set(&mut self, color: SetColor, states: Vec<StateIndex>) {
        let index = self.num_of_sets(color);
        self.insert_set(color, index, states);
    }

    /// Validates the collected data and constructs the automaton.
    pub fn finish(self) -> Result<Nsa, DeterminizeError> {
        let num_of_states = self.num_of_states;
        let check = |state: StateIndex| -> Result<usize, DeterminizeError> {
            if *state < num_of_states {
                Ok(*state)
            } else {
                Err(DeterminizeError::StateOutOfRange {
                    state: *state,
                    num_of_states,
                })
            }
        };

        if self.green_sets.is_empty() {
            return Err(DeterminizeError::NoGreenSets);
        }

        let mut start_states = bitvec![usize, Lsb0; 0; num_of_states];
        for state in &self.start_states {
            start_states.set(check(*state)?, true);
        }

        let to_state_set = |states: &Vec<StateIndex>| -> Result<StateSet, DeterminizeError> {
            let mut set = bitvec![usize, Lsb0; 0; num_of_states];
            for state in states {
                set.set(check(*state)?, true);
            }
            Ok(set)
        };

        let red_sets = self.red_sets.iter().map(&to_state_set).collect::<Result<Vec<_>, _>>()?;
        let green_sets = self.green_sets.iter().map(&to_state_set).collect::<Result<Vec<_>, _>>()?;

        // Sort the alphabet and determine where every label ends up.
        let labels = self.labels.into_vec();
        let mut order: Vec<usize> = (0..labels.len()).collect();
        order.sort_by(|left, right| labels[*left].cmp(&labels[*right]));

        let mut position = vec![0; labels.len()];
        for (sorted, label) in order.iter().enumerate() {
            position[*label] = sorted;
        }

        let mut successors = vec![vec![Vec::new(); num_of_states]; labels.len()];
        for (from, label, to) in &self.transitions {
            let per_state: &mut Vec<StateIndex> = &mut successors[position[*label]][check(*from)?];
            let to = StateIndex::new(check(*to)?);
            if !per_state.contains(&to) {
                per_state.push(to);
            }
        }

        let alphabet: Vec<String> = order.into_iter().map(|label| labels[label].clone()).collect();

        debug!(
            "Constructed automaton with {} states, alphabet {:?}, {} red sets and {} green sets",
            num_of_states,
            alphabet,
            red_sets.len(),
            green_sets.len()
        );

        Ok(Nsa {
            num_of_states,
            start_states,
            alphabet,
            successors,
            red_sets,
            green_sets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    /// Two states, `0 -[a]-> 0, 1` and `1 -[b]-> 0` with red set {1} and green set {0}.
    fn example_nsa() -> Nsa {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        let s1 = builder.add_state(false);

        builder.add_transition(s0, "b", s0);
        builder.add_transition(s0, "a", s0);
        builder.add_transition(s0, "a", s1);
        builder.add_transition(s1, "b", s0);

        builder.add_set(SetColor::Red, vec![s1]);
        builder.add_set(SetColor::Green, vec![s0]);
        builder.finish().unwrap()
    }

    #[test]
    fn test_sorted_alphabet() {
        let nsa = example_nsa();

        assert_eq!(nsa.alphabet(), &["a".to_string(), "b".to_string()]);
        assert_eq!(*nsa.symbol_index("b").unwrap(), 1);
        assert_eq!(nsa.num_of_transitions(), 4);
        assert_eq!(nsa.n_prime(), 4);
        assert_eq!(nsa.capacity(), 12);
    }

    #[test]
    fn test_transition_function() {
        let nsa = example_nsa();
        let a = nsa.symbol_index("a").unwrap();

        let mut states = nsa.empty_states();
        states.set(0, true);

        let result = nsa.transition_function(&states, &nsa.empty_annotations(), a).unwrap();
        assert_eq!(result.iter_ones().collect::<Vec<_>>(), vec![0, 1]);

        // Excluding annotation 0 removes its red set.
        let mut excluded = nsa.empty_annotations();
        excluded.set(0, true);
        let result = nsa.transition_function(&states, &excluded, a).unwrap();
        assert_eq!(result.iter_ones().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_retain_green() {
        let nsa = example_nsa();

        let mut states = nsa.empty_states();
        states.set(0, true);
        states.set(1, true);

        nsa.retain_green(&mut states, AnnotationIndex::new(0));
        assert_eq!(states.iter_ones().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_unknown_symbol() {
        let nsa = example_nsa();

        assert!(matches!(
            nsa.symbol_index("c"),
            Err(DeterminizeError::UnknownSymbol(symbol)) if symbol == "c"
        ));

        let result = nsa.transition_function(nsa.start_states(), &nsa.empty_annotations(), SymbolIndex::new(5));
        assert!(matches!(result, Err(DeterminizeError::SymbolOutOfRange { index: 5, .. })));
    }

    #[test]
    fn test_builder_validation() {
        let mut builder = NsaBuilder::new();
        let s0 = builder.add_state(true);
        builder.add_transition(s0, "a", StateIndex::new(3));
        builder.add_set(SetColor::Green, vec![s0]);

        assert!(matches!(
            builder.finish(),
            Err(DeterminizeError::StateOutOfRange { state: 3, .. })
        ));

        let mut builder = NsaBuilder::new();
        builder.add_state(true);
        assert!(matches!(builder.finish(), Err(DeterminizeError::NoGreenSets)));
    }
}
