use thiserror::Error;

/// The errors that can occur while constructing an automaton or during the
/// determinization itself. None of them are recoverable, a partial
/// deterministic automaton is never returned.
#[derive(Error, Debug)]
pub enum DeterminizeError {
    #[error("Unknown symbol '{0}', it does not occur in the transition table")]
    UnknownSymbol(String),

    #[error("Symbol index {index} is out of range, the alphabet has {num_of_symbols} symbols")]
    SymbolOutOfRange { index: usize, num_of_symbols: usize },

    #[error("State {state} is out of range, the automaton has {num_of_states} states")]
    StateOutOfRange { state: usize, num_of_states: usize },

    #[error("The automaton has no green sets, at least one is required to annotate the initial tree")]
    NoGreenSets,

    #[error("Spawning into slot {slot} exceeds the capacity {capacity} of tree {tree} on symbol '{symbol}'")]
    CapacityExceeded {
        tree: String,
        symbol: String,
        slot: usize,
        capacity: usize,
    },
}
