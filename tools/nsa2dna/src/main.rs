use std::fs::File;
use std::io::Write;
use std::io::stdout;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use safra_dna::Dna;
use safra_dna::DnaDot;
use safra_dna::determinize;
use safra_dna::read_nsa;
use safra_dna::write_dna;
use safra_tools::Version;
use safra_tools::VersionFlag;
use safra_tools::verbosity::VerbosityFlag;
use safra_utilities::SafraError;
use safra_utilities::Timing;

#[derive(clap::Parser, Debug)]
#[command(
    name = "nsa2dna",
    about = "Determinizes a nondeterministic Streett automaton into a deterministic automaton over annotated trees"
)]
struct Cli {
    #[command(flatten)]
    version: VersionFlag,

    #[command(flatten)]
    verbosity: VerbosityFlag,

    /// The input automaton in the line based format.
    #[arg(required_unless_present = "version")]
    input: Option<PathBuf>,

    /// The file to which the deterministic automaton is written.
    #[arg(required_unless_present = "version")]
    output: Option<PathBuf>,

    #[arg(long, help = "Write a complete Graphviz digraph instead of the bare state and transition lines")]
    dot: bool,

    #[arg(long, help = "Do not print the deterministic automaton to stdout")]
    no_stdout: bool,

    #[arg(long)]
    timings: bool,
}

fn main() -> Result<ExitCode, SafraError> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .parse_default_env()
        .init();

    if cli.version.into() {
        eprintln!("{}", Version);
        return Ok(ExitCode::SUCCESS);
    }

    let (Some(input), Some(output)) = (&cli.input, &cli.output) else {
        return Err("Both an input and an output file are required".into());
    };

    let timing = Timing::new();
    let result = run(input, output, cli.dot, !cli.no_stdout, &timing);

    if cli.timings {
        timing.print();
    }

    result?;
    Ok(ExitCode::SUCCESS)
}

/// Determinizes the automaton in `input` and writes the result to `output`,
/// and optionally to stdout. Failing to write the output file is reported but
/// does not abort the tool.
fn run(input: &Path, output: &Path, dot: bool, print: bool, timing: &Timing) -> Result<(), SafraError> {
    let mut timer = timing.start("read");
    let nsa = File::open(input).map_err(SafraError::from).and_then(read_nsa);
    timer.finish();
    let nsa = nsa?;

    let mut timer = timing.start("determinize");
    let dna = determinize(&nsa);
    timer.finish();
    let dna = dna?;

    let mut timer = timing.start("write");
    let result = write_output(&dna, output, dot, print);
    timer.finish();

    result
}

/// Prints the automaton to stdout when requested and writes it to `output`.
fn write_output(dna: &Dna, output: &Path, dot: bool, print: bool) -> Result<(), SafraError> {
    let text = render(dna, dot)?;

    if print {
        stdout().write_all(text.as_bytes())?;
    }

    if let Err(err) = File::create(output).and_then(|mut file| file.write_all(text.as_bytes())) {
        error!("Failed to write {}: {err}", output.display());
    }

    Ok(())
}

/// Renders the deterministic automaton in the requested output format.
fn render(dna: &Dna, dot: bool) -> Result<String, SafraError> {
    if dot {
        Ok(DnaDot::new(dna).to_string())
    } else {
        let mut output = Vec::new();
        write_dna(&mut output, dna)?;
        Ok(String::from_utf8(output)?)
    }
}
