use std::io::BufWriter;
use std::io::Write;

use log::info;

use safra_io::TimeProgress;
use safra_utilities::SafraError;

use crate::Dna;
use crate::FormatEdge;

/// Writes the deterministic automaton in the line format, first one line
/// `Q<i> [label="<tree>"]` for every state and then one line
/// `Q<from> -> Q<to> [label="<symbol>[<priority>]"]` for every transition.
///
/// Note that the writer is buffered internally using a `BufWriter`.
pub fn write_dna(writer: &mut impl Write, dna: &Dna) -> Result<(), SafraError> {
    let mut writer = BufWriter::new(writer);

    for state in dna.iter_states() {
        writeln!(writer, "\t\tQ{} [label=\"{}\"]", state, dna.label(state))?;
    }

    let mut progress = TimeProgress::new(
        |percentage: usize| info!("Writing transitions {percentage}%..."),
        1,
    );
    for (written, edge) in dna.edges().iter().enumerate() {
        writeln!(writer, "\t\t\t\t{}", FormatEdge { dna, edge })?;
        progress.print(written * 100 / dna.num_of_transitions());
    }

    writer.flush()?;
    Ok(())
}
