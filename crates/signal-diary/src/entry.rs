//! Core entry types for signal-diary.
//!
//! A [`LogEntry`] is one user-asserted signal problem. Nothing here is
//! measured: the type, the place and the notes all come from the user.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Location recorded when the user leaves the field blank.
pub const UNSPECIFIED_LOCATION: &str = "Not specified";

/// The kind of problem the user ran into.
///
/// This enum owns the only label/color/description table for issue types;
/// exporters and callers read it from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueType {
    /// The phone showed no signal at all.
    #[serde(rename = "no-signal", alias = "no_signal")]
    NoSignal,
    /// A call dropped or could not be placed.
    #[serde(rename = "call-failed", alias = "call_failed")]
    CallFailed,
    /// A text message did not send.
    #[serde(rename = "message-failed", alias = "message_failed")]
    MessageFailed,
}

impl IssueType {
    /// All issue types in canonical order.
    #[must_use]
    pub fn all() -> &'static [IssueType] {
        &[Self::NoSignal, Self::CallFailed, Self::MessageFailed]
    }

    /// Stable wire key, as persisted.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::NoSignal => "no-signal",
            Self::CallFailed => "call-failed",
            Self::MessageFailed => "message-failed",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NoSignal => "No Signal",
            Self::CallFailed => "Call Failed",
            Self::MessageFailed => "Message Didn't Send",
        }
    }

    /// Display color as a hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::NoSignal => "#ef4444",
            Self::CallFailed => "#f97316",
            Self::MessageFailed => "#3b82f6",
        }
    }

    /// One-line description shown next to the label.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NoSignal => "No bars or \"No Service\" on the phone",
            Self::CallFailed => "A call dropped or would not connect",
            Self::MessageFailed => "A text message failed to send",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a string names no known issue type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIssueType(pub String);

impl fmt::Display for UnknownIssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown issue type '{}' (expected no-signal, call-failed or message-failed)",
            self.0
        )
    }
}

impl std::error::Error for UnknownIssueType {}

impl FromStr for IssueType {
    type Err = UnknownIssueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "no-signal" => Ok(Self::NoSignal),
            "call-failed" => Ok(Self::CallFailed),
            "message-failed" => Ok(Self::MessageFailed),
            _ => Err(UnknownIssueType(s.to_string())),
        }
    }
}

/// A single logged signal problem.
///
/// Entries are immutable once created. The only way to change the diary is
/// to add or delete whole entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Opaque unique identifier.
    pub id: String,

    /// What went wrong.
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    /// Where it happened, free text.
    pub location: String,

    /// When the entry was created.
    pub timestamp: DateTime<Utc>,

    /// Optional free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LogEntry {
    /// Build an entry stamped with `timestamp`.
    ///
    /// Blank locations become [`UNSPECIFIED_LOCATION`] and blank notes are
    /// dropped.
    #[must_use]
    pub fn new(
        issue_type: IssueType,
        location: &str,
        notes: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::generate_id(timestamp),
            issue_type,
            location: normalize_location(location),
            timestamp,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    /// Generate an id from the creation time plus a random suffix.
    #[must_use]
    pub fn generate_id(timestamp: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", timestamp.timestamp_millis(), &suffix[..8])
    }

    /// Whether the user left the location blank.
    #[must_use]
    pub fn has_unspecified_location(&self) -> bool {
        self.location == UNSPECIFIED_LOCATION
    }
}

/// Trim a user-supplied location, substituting the sentinel for blanks.
#[must_use]
pub fn normalize_location(location: &str) -> String {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        UNSPECIFIED_LOCATION.to_string()
    } else {
        trimmed.to_string()
    }
}
