use clap::Args;
use log::LevelFilter;

/// The verbosity flags of a tool, which determine the log level.
#[derive(Args, Debug, Default)]
pub struct VerbosityFlag {
    #[arg(short, long, global = true, help = "Only print errors")]
    quiet: bool,

    #[arg(short, long, global = true, help = "Print progress information (default)")]
    verbose: bool,

    #[arg(short, long, global = true, help = "Print debug information")]
    debug: bool,

    #[arg(short, long, global = true, help = "Print every transition that is computed")]
    trace: bool,
}

impl VerbosityFlag {
    /// Returns the log level filter corresponding to the given verbosity flags.
    ///
    /// The most quiet flag wins when several are given.
    pub fn log_level_filter(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Info
        } else if self.debug {
            LevelFilter::Debug
        } else if self.trace {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(VerbosityFlag::default().log_level_filter(), LevelFilter::Info);

        let flag = VerbosityFlag {
            debug: true,
            ..Default::default()
        };
        assert_eq!(flag.log_level_filter(), LevelFilter::Debug);

        let flag = VerbosityFlag {
            quiet: true,
            trace: true,
            ..Default::default()
        };
        assert_eq!(flag.log_level_filter(), LevelFilter::Error);
    }
}
