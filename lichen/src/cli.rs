// lichen/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use lichen_common::error::Result;
use lichen_common::Config;

pub mod report;
pub mod verify;

use crate::cli::report::Report;
use crate::cli::verify::Verify;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "lichen", bin_name = "lichen")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to ./lichen.toml, then the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the dependencies of an artifact and check their licenses
    Verify(Verify),
    /// Print the results of the last verify run
    Report(Report),
}

impl Command {
    /// Output directory override given on the command line, if any.
    pub fn output_dir(&self) -> Option<&PathBuf> {
        match self {
            Self::Verify(command) => command.output_dir.as_ref(),
            Self::Report(command) => command.output_dir.as_ref(),
        }
    }

    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Verify(command) => command.run(config),
            Self::Report(command) => command.run(config),
        }
    }
}
