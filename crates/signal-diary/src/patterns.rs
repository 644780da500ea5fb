//! Time-windowed pattern analysis.
//!
//! A [`PatternAnalyzer`] selects the entries inside a [`Timeframe`] window
//! ending at "now" and derives breakdowns by issue type, location and time
//! of day, plus a few plain-language insights. Every number the reports
//! print comes from here.
//!
//! Hours are bucketed in the analyzer's time zone, which is the local zone
//! unless an explicit one is supplied with [`PatternAnalyzer::at`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, Months, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{classify, Tier};
use crate::entry::{normalize_location, IssueType, LogEntry, UNSPECIFIED_LOCATION};

/// Label shown for entries logged without a location.
pub const UNSPECIFIED_LABEL: &str = "Unspecified";

/// How far back the analysis window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// The last seven days.
    #[default]
    Week,
    /// The last calendar month.
    Month,
    /// The last calendar year.
    Year,
}

impl Timeframe {
    /// All timeframes, shortest first.
    #[must_use]
    pub fn all() -> &'static [Timeframe] {
        &[Self::Week, Self::Month, Self::Year]
    }

    /// Start of the window ending at `now`.
    #[must_use]
    pub fn cutoff<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Self::Week => now.clone() - Duration::days(7),
            Self::Month => now
                .clone()
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now.clone() - Duration::days(30)),
            Self::Year => now
                .clone()
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now.clone() - Duration::days(365)),
        }
    }

    /// Phrase used in prose, e.g. "3 issues this week".
    #[must_use]
    pub fn period(self) -> &'static str {
        match self {
            Self::Week => "this week",
            Self::Month => "this month",
            Self::Year => "this year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        })
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown timeframe '{other}' (expected week, month or year)")),
        }
    }
}

/// Part of the day an entry was logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// 05:00 to 11:59.
    Morning,
    /// 12:00 to 16:59.
    Afternoon,
    /// 17:00 to 20:59.
    Evening,
    /// 21:00 to 04:59.
    Night,
}

impl TimeOfDay {
    /// All buckets in canonical order.
    #[must_use]
    pub fn all() -> &'static [TimeOfDay] {
        &[Self::Morning, Self::Afternoon, Self::Evening, Self::Night]
    }

    /// Bucket for an hour of the day.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Label with the hour range.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning (5AM-12PM)",
            Self::Afternoon => "Afternoon (12PM-5PM)",
            Self::Evening => "Evening (5PM-9PM)",
            Self::Night => "Night (9PM-5AM)",
        }
    }

    /// Lowercase name for prose.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }
}

/// Count for one issue type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStat {
    /// The issue type.
    pub issue_type: IssueType,
    /// Entries of this type in the window.
    pub count: usize,
    /// Share of the window, rounded to a whole percent.
    pub percentage: usize,
}

/// Count for one location, with its per-type split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationStat {
    /// Location text; unspecified locations are shown as "Unspecified".
    pub location: String,
    /// Entries at this location in the window.
    pub count: usize,
    /// Share of the window, rounded to a whole percent.
    pub percentage: usize,
    /// Non-zero per-type counts in canonical type order.
    pub by_type: Vec<(IssueType, usize)>,
}

/// Count for one time-of-day bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeOfDayStat {
    /// The bucket.
    pub bucket: TimeOfDay,
    /// Entries logged in this bucket.
    pub count: usize,
    /// Share of the window, rounded to a whole percent.
    pub percentage: usize,
}

/// Everything the analyzer knows about one window, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternSummary {
    /// The window.
    pub timeframe: Timeframe,
    /// Entries in the window.
    pub total: usize,
    /// Connection health for the window.
    pub tier: Tier,
    /// Issue type breakdown.
    pub issue_types: Vec<TypeStat>,
    /// Top locations.
    pub locations: Vec<LocationStat>,
    /// Time-of-day breakdown.
    pub time_of_day: Vec<TimeOfDayStat>,
    /// Plain-language observations.
    pub insights: Vec<String>,
}

/// Derived view over the entries inside one window.
pub struct PatternAnalyzer<'a, Tz: TimeZone = Local> {
    window: Vec<&'a LogEntry>,
    timeframe: Timeframe,
    now: DateTime<Tz>,
}

impl<Tz: TimeZone> fmt::Debug for PatternAnalyzer<'_, Tz> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternAnalyzer")
            .field("timeframe", &self.timeframe)
            .field("window", &self.window.len())
            .field("now", &self.now.naive_local())
            .finish()
    }
}

impl<'a> PatternAnalyzer<'a, Local> {
    /// Analyze the window ending now, in the local time zone.
    #[must_use]
    pub fn new(entries: &'a [LogEntry], timeframe: Timeframe) -> Self {
        Self::at(entries, timeframe, Local::now())
    }
}

impl<'a, Tz: TimeZone> PatternAnalyzer<'a, Tz> {
    /// Analyze the window ending at `now`, bucketing hours in `now`'s zone.
    #[must_use]
    pub fn at(entries: &'a [LogEntry], timeframe: Timeframe, now: DateTime<Tz>) -> Self {
        let cutoff = timeframe.cutoff(&now).with_timezone(&Utc);
        let window = entries.iter().filter(|e| e.timestamp >= cutoff).collect();
        Self {
            window,
            timeframe,
            now,
        }
    }

    /// The selected timeframe.
    #[must_use]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Entries in the window, newest first.
    #[must_use]
    pub fn window(&self) -> &[&'a LogEntry] {
        &self.window
    }

    /// Number of entries in the window.
    #[must_use]
    pub fn total(&self) -> usize {
        self.window.len()
    }

    /// Connection health for the window.
    #[must_use]
    pub fn tier(&self) -> Tier {
        classify(self.total())
    }

    /// Every issue type, most frequent first.
    #[must_use]
    pub fn issue_type_breakdown(&self) -> Vec<TypeStat> {
        let total = self.total();
        let mut stats: Vec<TypeStat> = IssueType::all()
            .iter()
            .map(|&issue_type| {
                let count = self
                    .window
                    .iter()
                    .filter(|e| e.issue_type == issue_type)
                    .count();
                TypeStat {
                    issue_type,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }

    /// The `top_n` most frequent locations.
    #[must_use]
    pub fn location_breakdown(&self, top_n: usize) -> Vec<LocationStat> {
        let total = self.total();
        let mut by_location: HashMap<String, Vec<&LogEntry>> = HashMap::new();
        for entry in &self.window {
            by_location
                .entry(normalize_location(&entry.location))
                .or_default()
                .push(*entry);
        }

        let mut stats: Vec<LocationStat> = by_location
            .into_iter()
            .map(|(location, entries)| {
                let by_type = IssueType::all()
                    .iter()
                    .map(|&t| (t, entries.iter().filter(|e| e.issue_type == t).count()))
                    .filter(|(_, count)| *count > 0)
                    .collect();
                let location = if location == UNSPECIFIED_LOCATION {
                    UNSPECIFIED_LABEL.to_string()
                } else {
                    location
                };
                LocationStat {
                    location,
                    count: entries.len(),
                    percentage: percentage(entries.len(), total),
                    by_type,
                }
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
        stats.truncate(top_n);
        stats
    }

    /// Every time-of-day bucket, most frequent first.
    #[must_use]
    pub fn time_of_day_breakdown(&self) -> Vec<TimeOfDayStat> {
        let total = self.total();
        let zone = self.now.timezone();
        let mut counts: HashMap<TimeOfDay, usize> = HashMap::new();
        for entry in &self.window {
            let hour = entry.timestamp.with_timezone(&zone).hour();
            *counts.entry(TimeOfDay::from_hour(hour)).or_default() += 1;
        }

        let mut stats: Vec<TimeOfDayStat> = TimeOfDay::all()
            .iter()
            .map(|&bucket| {
                let count = counts.get(&bucket).copied().unwrap_or(0);
                TimeOfDayStat {
                    bucket,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        stats
    }

    /// Observations worth showing, possibly none.
    #[must_use]
    pub fn insights(&self) -> Vec<String> {
        let mut insights = Vec::new();

        if let Some(top) = self.location_breakdown(1).first() {
            if top.count > 1 {
                insights.push(format!(
                    "Most issues occur at {} ({} issues)",
                    top.location, top.count
                ));
            }
        }

        if let Some(top) = self.time_of_day_breakdown().first() {
            if top.count > 1 && top.percentage > 40 {
                insights.push(format!(
                    "{}% of issues occur in the {}",
                    top.percentage,
                    top.bucket.name()
                ));
            }
        }

        if let Some(top) = self.issue_type_breakdown().first() {
            if top.count > 1 {
                insights.push(format!(
                    "{} is the most common issue ({} times)",
                    top.issue_type.label(),
                    top.count
                ));
            }
        }

        insights
    }

    /// Bundle every view of the window, with `top_locations` locations.
    #[must_use]
    pub fn summary(&self, top_locations: usize) -> PatternSummary {
        PatternSummary {
            timeframe: self.timeframe,
            total: self.total(),
            tier: self.tier(),
            issue_types: self.issue_type_breakdown(),
            locations: self.location_breakdown(top_locations),
            time_of_day: self.time_of_day_breakdown(),
            insights: self.insights(),
        }
    }
}

/// `count` as a whole percentage of `total`, rounding halves up.
fn percentage(count: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        (200 * count + total) / (2 * total)
    }
}
