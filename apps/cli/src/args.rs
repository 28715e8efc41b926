//! Command-line arguments. Running without any argument is the normal invocation.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "iaflat")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flatten an ItemsAdder plugin directory in place")]
#[command(
    long_about = "Collects per-namespace assets from plugins/ItemsAdder into the flat \
                  contents/resourcepack layout, merges sounds.json and fonts.json, and \
                  rewrites config references to the new names. Run /ia reload afterwards."
)]
pub struct Args {
    /// Server directory containing plugins/ItemsAdder [default: current directory]
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Configuration file [default: ./iaflat.toml when present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Also write daily-rotated log files to this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
