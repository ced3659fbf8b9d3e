use std::collections::HashSet;

use log::debug;
use test_case::test_case;

use safra_dna::DeterminizeError;
use safra_dna::Dna;
use safra_dna::DnaTree;
use safra_dna::Nsa;
use safra_dna::ROOT;
use safra_dna::determinize;
use safra_dna::random_nsa;
use safra_dna::read_nsa;
use safra_dna::write_dna;
use safra_utilities::random_test;
use safra_utilities::test_logger;

fn write_to_string(dna: &Dna) -> String {
    let mut output = Vec::new();
    write_dna(&mut output, dna).unwrap();
    String::from_utf8(output).unwrap()
}

#[test_case(include_str!("data/single_step.nsa"), include_str!("data/single_step.dna") ; "single_step")]
#[test_case(include_str!("data/self_loop.nsa"), include_str!("data/self_loop.dna") ; "self_loop")]
fn test_determinize_files(input: &str, expected: &str) {
    let _ = test_logger();

    let nsa = read_nsa(input.as_bytes()).unwrap();
    let dna = determinize(&nsa).unwrap();

    assert_eq!(write_to_string(&dna), expected);
}

/// Checks the structural properties that every reachable tree must satisfy.
fn check_tree(nsa: &Nsa, tree: &DnaTree) {
    for node in tree.iter_nodes().skip(1) {
        let parent = tree.parent(node).unwrap();
        assert!(parent < node, "The parent of {node} must precede it in {tree}");
    }
    assert_eq!(tree.parent(ROOT), None);

    for (state, owner) in tree.iter_owners() {
        assert!(
            *owner < tree.num_of_nodes(),
            "State {state} is owned by a node that does not exist in {tree}"
        );
    }

    assert!(
        tree.num_of_nodes() <= nsa.capacity(),
        "Tree {tree} has more than {} nodes",
        nsa.capacity()
    );
}

/// Determinizes the automaton, returns None when a tree outgrows the slot
/// capacity. Only degenerate automata, such as those whose green sets miss
/// every reachable state, are rejected this way.
fn try_determinize(nsa: &Nsa) -> Option<Dna> {
    match determinize(nsa) {
        Ok(dna) => Some(dna),
        Err(DeterminizeError::CapacityExceeded { tree, symbol, .. }) => {
            debug!("Skipping automaton, tree {tree} exceeds the capacity on symbol {symbol}");
            None
        }
        Err(error) => panic!("Unexpected error {error}"),
    }
}

fn check_dna(nsa: &Nsa, dna: &Dna) {
    assert_eq!(dna.label(dna.initial_state()), DnaTree::initial(nsa).to_string());

    let labels: HashSet<&str> = dna.iter_states().map(|state| dna.label(state)).collect();
    assert_eq!(labels.len(), dna.num_of_states(), "Every tree must occur only once");

    for state in dna.iter_states() {
        check_tree(nsa, dna.tree(state));
        assert_eq!(dna.tree(state).to_string(), dna.label(state));
        assert_eq!(dna.outgoing_edges(state).count(), nsa.alphabet().len());
    }

    assert_eq!(dna.num_of_transitions(), dna.num_of_states() * nsa.alphabet().len());
}

#[test]
fn test_random_determinize() {
    let _ = test_logger();

    random_test(50, |rng| {
        let nsa = random_nsa(rng, 3, 2, 1, 2);
        if let Some(dna) = try_determinize(&nsa) {
            check_dna(&nsa, &dna);
        }
    });
}

#[test]
fn test_random_determinize_annotations() {
    let _ = test_logger();

    random_test(20, |rng| {
        let nsa = random_nsa(rng, 2, 2, 2, 2);
        if let Some(dna) = try_determinize(&nsa) {
            check_dna(&nsa, &dna);
        }
    });
}

#[test]
fn test_random_determinize_deterministic() {
    let _ = test_logger();

    random_test(20, |rng| {
        let nsa = random_nsa(rng, 3, 2, 1, 2);

        let first = try_determinize(&nsa).map(|dna| write_to_string(&dna));
        let second = try_determinize(&nsa).map(|dna| write_to_string(&dna));
        assert_eq!(first, second);
    });
}

#[test]
fn test_random_transition_matches_edges() {
    let _ = test_logger();

    random_test(20, |rng| {
        let nsa = random_nsa(rng, 3, 2, 1, 2);
        let Some(dna) = try_determinize(&nsa) else {
            return;
        };

        // Recomputing a transition gives the tree and priority of the recorded edge.
        for edge in dna.edges() {
            let transition = dna
                .tree(edge.from)
                .transition(&nsa, dna.symbol_name(edge.symbol))
                .unwrap();
            assert_eq!(&transition.tree, dna.tree(edge.to));
            assert_eq!(transition.priority, edge.priority);
        }
    });
}
