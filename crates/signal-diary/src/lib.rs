//! `signal-diary` - A local diary of mobile signal problems
//!
//! This library owns the canonical log of user-reported signal issues and the
//! optional user profile, derives location, time and type patterns from them,
//! classifies overall connection health, and renders CSV and printable
//! reports for carriers and caregivers.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod classify;
pub mod cli;
pub mod config;
pub mod entries;
pub mod entry;
pub mod error;
pub mod locations;
pub mod logging;
pub mod patterns;
pub mod profile;
pub mod providers;
pub mod report;
pub mod storage;

pub use classify::{classify, Tier};
pub use config::Config;
pub use entries::{ClearRequest, EntryQuery, EntryStore};
pub use entry::{IssueType, LogEntry, UNSPECIFIED_LOCATION};
pub use error::{Error, Result};
pub use locations::{LocationCount, LocationIndex};
pub use logging::init_logging;
pub use patterns::{PatternAnalyzer, PatternSummary, TimeOfDay, Timeframe};
pub use profile::{ProfileStore, UserProfile};
pub use providers::{ProviderInfo, Region};
pub use report::{Export, Format, ReportExporter};
pub use storage::{MemoryStore, RecordStore, SqliteStore, StorageStats};
