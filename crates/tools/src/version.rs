use std::fmt;

use clap::Args;

/// Adds a `--version` flag to a tool.
#[derive(Args, Debug)]
pub struct VersionFlag {
    #[arg(long, global = true, help = "Print the version of this tool")]
    version: bool,
}

impl From<VersionFlag> for bool {
    fn from(flag: VersionFlag) -> Self {
        flag.version
    }
}

/// Displays the version of the toolset.
pub struct Version;

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "safra toolset version {}", env!("CARGO_PKG_VERSION"))
    }
}
