use rand::Rng;

use crate::Nsa;
use crate::NsaBuilder;
use crate::SetColor;
use crate::StateIndex;

/// Generates a random automaton with the desired number of states, symbols,
/// annotations and maximum out degree. State zero is always a start state, and
/// every other state is a start state with a small probability. The red and
/// green sets contain every state with probability one half.
pub fn random_nsa(
    rng: &mut impl Rng,
    num_of_states: usize,
    num_of_symbols: u32,
    num_of_annotations: usize,
    outdegree: usize,
) -> Nsa {
    assert!(
        (1..=26).contains(&num_of_symbols),
        "Between 1 and 26 symbols are supported, since symbols are lower case letters."
    );
    assert!(num_of_states > 0, "At least one state is required");
    assert!(num_of_annotations > 0, "At least one annotation is required");

    let symbols: Vec<String> = (0..num_of_symbols)
        .map(|i| char::from(b'a' + i as u8).to_string())
        .collect();

    let mut builder = NsaBuilder::new();
    for state in 0..num_of_states {
        builder.add_state(state == 0 || rng.random_bool(0.2));
    }

    for from in 0..num_of_states {
        for _ in 0..rng.random_range(0..=outdegree) {
            let symbol = &symbols[rng.random_range(0..symbols.len())];
            let to = rng.random_range(0..num_of_states);

            builder.add_transition(StateIndex::new(from), symbol, StateIndex::new(to));
        }
    }

    for color in [SetColor::Red, SetColor::Green] {
        for _ in 0..num_of_annotations {
            let states = (0..num_of_states)
                .filter(|_| rng.random_bool(0.5))
                .map(StateIndex::new)
                .collect();
            builder.add_set(color, states);
        }
    }

    builder
        .finish()
        .expect("The generated automaton only refers to existing states")
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use safra_utilities::random_test;

    #[test]
    fn test_random_nsa() {
        random_test(100, |rng| {
            let nsa = random_nsa(rng, 5, 3, 2, 3);

            assert_eq!(nsa.num_of_states(), 5);
            assert_eq!(nsa.num_of_annotations(), 2);
            assert!(nsa.start_states()[0]);
            assert!(nsa.alphabet().len() <= 3);
            assert!(nsa.num_of_transitions() <= 5 * 3);
        });
    }
}
