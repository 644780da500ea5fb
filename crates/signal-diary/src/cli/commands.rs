//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Subcommand, ValueEnum};

use crate::entry::IssueType;
use crate::patterns::Timeframe;
use crate::providers::Region;
use crate::report::Format;

/// Log command arguments.
#[derive(Debug, Args)]
pub struct LogCommand {
    /// What went wrong
    #[arg(value_enum)]
    pub issue_type: IssueTypeArg,

    /// Where it happened (blank is recorded as "Not specified")
    #[arg(short, long)]
    pub location: Option<String>,

    /// Optional notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Filter by issue type
    #[arg(short = 't', long = "type", value_enum)]
    pub issue_type: Option<IssueTypeArg>,

    /// Filter by exact location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Show entries since this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Show entries until this time (RFC 3339 or YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_until)]
    pub until: Option<DateTime<Utc>>,

    /// Maximum number of entries to show
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the entry to delete
    pub id: String,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Actually delete (without this, only reports what would be deleted)
    #[arg(short, long)]
    pub yes: bool,

    /// Also clear the saved profile
    #[arg(long)]
    pub all: bool,
}

/// Locations command arguments.
#[derive(Debug, Args)]
pub struct LocationsCommand {
    /// Number of recent locations to show
    #[arg(long)]
    pub recent: Option<usize>,

    /// Number of common locations to show
    #[arg(long)]
    pub common: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Patterns command arguments.
#[derive(Debug, Args)]
pub struct PatternsCommand {
    /// Analysis window
    #[arg(short, long, value_enum)]
    pub timeframe: Option<TimeframeArg>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Document format
    #[arg(value_enum)]
    pub format: FormatArg,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Window for the status and summary numbers
    #[arg(short, long, value_enum)]
    pub timeframe: Option<TimeframeArg>,
}

/// Profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the saved profile
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Update profile fields (pass an empty string to clear one)
    Set(ProfileFields),

    /// Delete the saved profile
    Clear,
}

/// Profile fields accepted by `profile set`.
#[derive(Debug, Default, Args)]
pub struct ProfileFields {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,

    /// Postal address
    #[arg(long)]
    pub address: Option<String>,

    /// Contact phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Provider key from `sigdiary providers`, or "other"
    #[arg(long)]
    pub provider: Option<String>,

    /// Provider name when --provider is "other"
    #[arg(long)]
    pub custom_provider: Option<String>,

    /// Region for labels and the provider list
    #[arg(long, value_enum)]
    pub region: Option<RegionArg>,
}

/// Providers command arguments.
#[derive(Debug, Args)]
pub struct ProvidersCommand {
    /// Only list providers in this region
    #[arg(short, long, value_enum)]
    pub region: Option<RegionArg>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Issue type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IssueTypeArg {
    /// No bars or "No Service"
    NoSignal,
    /// A call dropped or would not connect
    CallFailed,
    /// A text message failed to send
    MessageFailed,
}

impl From<IssueTypeArg> for IssueType {
    fn from(arg: IssueTypeArg) -> Self {
        match arg {
            IssueTypeArg::NoSignal => Self::NoSignal,
            IssueTypeArg::CallFailed => Self::CallFailed,
            IssueTypeArg::MessageFailed => Self::MessageFailed,
        }
    }
}

/// Timeframe argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeframeArg {
    /// The last seven days
    Week,
    /// The last month
    Month,
    /// The last year
    Year,
}

impl From<TimeframeArg> for Timeframe {
    fn from(arg: TimeframeArg) -> Self {
        match arg {
            TimeframeArg::Week => Self::Week,
            TimeframeArg::Month => Self::Month,
            TimeframeArg::Year => Self::Year,
        }
    }
}

/// Region argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegionArg {
    /// United States
    Us,
    /// United Kingdom
    #[value(alias = "uk")]
    Gb,
}

impl From<RegionArg> for Region {
    fn from(arg: RegionArg) -> Self {
        match arg {
            RegionArg::Us => Self::Us,
            RegionArg::Gb => Self::Gb,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Sectioned CSV for spreadsheets
    Csv,
    /// Printable HTML report
    Html,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => Self::Csv,
            FormatArg::Html => Self::Html,
        }
    }
}

/// Parse a lower time bound. A bare date means local midnight.
///
/// # Errors
///
/// Returns a message if `value` is neither RFC 3339 nor `YYYY-MM-DD`.
pub fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(value, NaiveTime::from_hms_opt(0, 0, 0))
}

/// Parse an upper time bound. A bare date means the end of that local day.
///
/// # Errors
///
/// Returns a message if `value` is neither RFC 3339 nor `YYYY-MM-DD`.
pub fn parse_until(value: &str) -> Result<DateTime<Utc>, String> {
    parse_bound(value, NaiveTime::from_hms_milli_opt(23, 59, 59, 999))
}

fn parse_bound(value: &str, time: Option<NaiveTime>) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}' (expected YYYY-MM-DD or RFC 3339)"))?;
    let time = time.ok_or_else(|| "invalid time of day".to_string())?;
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| format!("'{value}' does not exist in the local time zone"))
}
