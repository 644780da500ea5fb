//! Command-line interface for signal-diary.
//!
//! This module provides the CLI structure for the `sigdiary` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_since, parse_until, ClearCommand, ConfigCommand, DeleteCommand, ExportCommand,
    FormatArg, HistoryCommand, IssueTypeArg, LocationsCommand, LogCommand, PatternsCommand,
    ProfileCommand, ProfileFields, ProvidersCommand, RegionArg, StatusCommand, TimeframeArg,
};

/// sigdiary - Keep a diary of mobile signal problems
///
/// Log dropped calls, failed texts and dead zones as they happen, spot the
/// patterns, and export a report your carrier or caregiver can act on.
#[derive(Debug, Parser)]
#[command(name = "sigdiary")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a signal problem
    Log(LogCommand),

    /// List logged problems, newest first
    History(HistoryCommand),

    /// Delete one entry
    Delete(DeleteCommand),

    /// Delete every entry
    Clear(ClearCommand),

    /// Show recent and frequent locations
    Locations(LocationsCommand),

    /// Analyze patterns over a time window
    Patterns(PatternsCommand),

    /// Export a report
    Export(ExportCommand),

    /// View or edit your contact details
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// List known network providers
    Providers(ProvidersCommand),

    /// Show diary and storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
