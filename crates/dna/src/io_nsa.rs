use std::io::Read;

use log::debug;
use log::info;
use log::warn;
use regex::Regex;
use streaming_iterator::StreamingIterator;
use thiserror::Error;

use safra_io::LineIterator;
use safra_utilities::SafraError;

use crate::Nsa;
use crate::NsaBuilder;
use crate::SetColor;
use crate::StateIndex;

#[derive(Error, Debug)]
pub enum IOError {
    #[error("Set {color}_{index} is out of order, only {num_of_sets} sets of this color were read")]
    SetOutOfOrder {
        color: SetColor,
        index: usize,
        num_of_sets: usize,
    },
}

/// Reads a nondeterministic automaton in a Graphviz-like line format from the
/// given reader. Note that the reader is buffered internally using a `BufReader`.
///
/// Every line is one of the following, lines in any other form are skipped:
///  `q<i> [label="q<i>"]`, `q<i> [label="q<i>$"]`, `q<i> [label="*q<i>"]` or
///  `q<i> [label="*q<i>$"]` declares the next state, the `*` marks a start state.
///  `q<from> -> q<to> [label=<symbol>]` adds a transition.
///  `R_<i> <states>` and `G_<i> <states>` define the red and green sets, sets
///  of any other color are skipped with a warning.
///
/// States are numbered in order of declaration. Leading whitespace is ignored.
pub fn read_nsa(reader: impl Read) -> Result<Nsa, SafraError> {
    info!("Reading automaton...");

    let transition_regex =
        Regex::new(r"^\s*q(\d+) -> q(\d+) \[label=(\S+)\]$").expect("Regex compilation should not fail");
    let set_regex = Regex::new(r"^\s*(\S)_(\d+)(?: (.*))?$").expect("Regex compilation should not fail");
    let state_regex =
        Regex::new(r#"^\s*q\d+ \[label="(\*?)q\d+\$?"\]$"#).expect("Regex compilation should not fail");

    let mut builder = NsaBuilder::new();
    let mut lines = LineIterator::new(reader);

    while let Some(line) = lines.next() {
        if let Some(captures) = transition_regex.captures(line) {
            let from = StateIndex::new(captures[1].parse()?);
            let to = StateIndex::new(captures[2].parse()?);
            builder.add_transition(from, &captures[3], to);
        } else if let Some(captures) = set_regex.captures(line) {
            let color = match &captures[1] {
                "R" => SetColor::Red,
                "G" => SetColor::Green,
                other => {
                    warn!("Skipping set with invalid color '{other}', expected R or G: '{line}'");
                    continue;
                }
            };

            let index: usize = captures[2].parse()?;
            let num_of_sets = builder.num_of_sets(color);
            if index > num_of_sets {
                return Err(IOError::SetOutOfOrder {
                    color,
                    index,
                    num_of_sets,
                }
                .into());
            }

            let states = captures
                .get(3)
                .map_or("", |states| states.as_str())
                .split_whitespace()
                .map(|state| state.parse().map(StateIndex::new))
                .collect::<Result<Vec<_>, _>>()?;

            builder.insert_set(color, index, states);
        } else if let Some(captures) = state_regex.captures(line) {
            builder.add_state(&captures[1] == "*");
        } else {
            debug!("Skipping line '{line}'");
        }
    }

    if let Some(error) = lines.take_error() {
        return Err(error.into());
    }

    let nsa = builder.finish()?;
    info!(
        "Read automaton with {} states and {} transitions",
        nsa.num_of_states(),
        nsa.num_of_transitions()
    );

    Ok(nsa)
}
