//! Carrier-ready exports of the diary.
//!
//! Both formats are rendered from one shared context, which takes every
//! aggregate from [`PatternAnalyzer`] and [`classify`](crate::classify::classify),
//! so a report never disagrees with the pattern views. Rendering is pure: the
//! caller decides where the text goes.

mod csv;
mod html;

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use tracing::info;

use crate::classify::Tier;
use crate::entry::{IssueType, LogEntry};
use crate::error::Result;
use crate::patterns::{PatternAnalyzer, Timeframe, TypeStat};
use crate::profile::UserProfile;
use crate::providers::{LabelSet, ProviderInfo, Region};

/// How many locations the status section lists.
const AFFECTED_LOCATIONS: usize = 5;

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// The diary is empty; show a notice instead of producing a file.
    NothingToExport,
    /// The rendered document.
    Ready(String),
}

impl Export {
    /// The rendered document, if any.
    #[must_use]
    pub fn into_content(self) -> Option<String> {
        match self {
            Self::NothingToExport => None,
            Self::Ready(content) => Some(content),
        }
    }

    /// Whether a document was produced.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Sectioned CSV for spreadsheets.
    Csv,
    /// Self-contained printable HTML.
    Html,
}

impl Format {
    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }

    /// Suggested file name for a report generated on `date`.
    #[must_use]
    pub fn file_name<Tz: TimeZone>(self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        format!(
            "signal-connection-report-{}.{}",
            date.format("%Y-%m-%d"),
            self.extension()
        )
    }
}

/// Renders entries and the profile into export documents.
///
/// Entries may be passed in any order; the detailed log is always written
/// newest first.
#[derive(Debug, Clone)]
pub struct ReportExporter<Tz: TimeZone = Local> {
    now: DateTime<Tz>,
    timeframe: Timeframe,
    region: Region,
}

impl ReportExporter<Local> {
    /// An exporter stamped with the current local time.
    ///
    /// `timeframe` is the window for the status and summary numbers;
    /// `region` applies when the profile doesn't choose one.
    #[must_use]
    pub fn new(timeframe: Timeframe, region: Region) -> Self {
        Self::at(Local::now(), timeframe, region)
    }
}

impl<Tz: TimeZone> ReportExporter<Tz>
where
    Tz::Offset: Display,
{
    /// An exporter stamped with `now`; dates render in `now`'s zone.
    #[must_use]
    pub fn at(now: DateTime<Tz>, timeframe: Timeframe, region: Region) -> Self {
        Self {
            now,
            timeframe,
            region,
        }
    }

    /// Render the sectioned CSV report.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn to_csv(&self, entries: &[LogEntry], profile: &UserProfile) -> Result<Export> {
        if entries.is_empty() {
            info!("Nothing to export");
            return Ok(Export::NothingToExport);
        }
        let document = csv::render(&self.context(entries, profile))?;
        info!(entries = entries.len(), bytes = document.len(), "CSV report rendered");
        Ok(Export::Ready(document))
    }

    /// Render the printable HTML report.
    #[must_use]
    pub fn to_printable_report(&self, entries: &[LogEntry], profile: &UserProfile) -> Export {
        if entries.is_empty() {
            info!("Nothing to export");
            return Export::NothingToExport;
        }
        let document = html::render(&self.context(entries, profile));
        info!(entries = entries.len(), bytes = document.len(), "Printable report rendered");
        Export::Ready(document)
    }

    /// Render in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn export(
        &self,
        format: Format,
        entries: &[LogEntry],
        profile: &UserProfile,
    ) -> Result<Export> {
        match format {
            Format::Csv => self.to_csv(entries, profile),
            Format::Html => Ok(self.to_printable_report(entries, profile)),
        }
    }

    fn context<'a>(&self, entries: &'a [LogEntry], profile: &'a UserProfile) -> ReportContext<'a, Tz> {
        let analyzer = PatternAnalyzer::at(entries, self.timeframe, self.now.clone());

        let breakdown = analyzer.issue_type_breakdown();
        let most_common = breakdown
            .first()
            .filter(|s| s.count > 0)
            .map(|s| s.issue_type);
        let mut type_counts = breakdown;
        type_counts.sort_by_key(|s| s.issue_type);

        // Stable, so equal timestamps keep the caller's order.
        let mut rows: Vec<&LogEntry> = entries.iter().collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        ReportContext {
            generated: self.now.clone(),
            timeframe: self.timeframe,
            labels: profile.region_or(self.region).labels(),
            tier: analyzer.tier(),
            window_total: analyzer.total(),
            type_counts,
            most_common,
            affected_locations: analyzer
                .location_breakdown(AFFECTED_LOCATIONS)
                .into_iter()
                .map(|s| s.location)
                .collect(),
            profile,
            provider: profile.resolve_provider(),
            entries: rows,
        }
    }
}

/// Everything a renderer needs, computed once.
struct ReportContext<'a, Tz: TimeZone> {
    generated: DateTime<Tz>,
    timeframe: Timeframe,
    labels: &'static LabelSet,
    tier: Tier,
    window_total: usize,
    /// Window counts per type in canonical order.
    type_counts: Vec<TypeStat>,
    most_common: Option<IssueType>,
    affected_locations: Vec<String>,
    profile: &'a UserProfile,
    provider: Option<ProviderInfo>,
    /// Every entry, newest first.
    entries: Vec<&'a LogEntry>,
}

impl<Tz: TimeZone> ReportContext<'_, Tz> {
    fn issue_frequency(&self) -> String {
        match self.window_total {
            0 => format!("No issues reported {}", self.timeframe.period()),
            1 => format!("1 issue {}", self.timeframe.period()),
            n => format!("{n} issues {}", self.timeframe.period()),
        }
    }

    fn most_common_label(&self) -> &'static str {
        self.most_common
            .map_or("None", |t| self.labels.issue_label(t))
    }

    fn has_notes(&self) -> bool {
        self.entries.iter().any(|e| e.notes.is_some())
    }

    fn reference(&self) -> String {
        format!("SR-{:06}", self.generated.timestamp_millis().rem_euclid(1_000_000))
    }
}

impl<Tz: TimeZone> ReportContext<'_, Tz>
where
    Tz::Offset: Display,
{
    fn generated_stamp(&self) -> String {
        format!(
            "{} {}",
            self.generated.format(self.labels.date_format),
            self.generated.format(self.labels.time_format)
        )
    }

    /// Date and time columns for an entry, in the report's zone.
    fn entry_stamp(&self, entry: &LogEntry) -> (String, String) {
        let local = entry.timestamp.with_timezone(&self.generated.timezone());
        (
            local.format(self.labels.date_format).to_string(),
            local.format(self.labels.time_format).to_string(),
        )
    }
}

/// Collapse line breaks so a value stays on one line.
fn single_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, Utc};

    use super::*;

    pub(super) fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 15, 18, 30, 0)
            .unwrap()
    }

    pub(super) fn entry(issue_type: IssueType, location: &str, hours_ago: i64) -> LogEntry {
        let at = (now() - Duration::hours(hours_ago)).with_timezone(&Utc);
        LogEntry::new(issue_type, location, None, at)
    }

    /// `n` entries, newest first, alternating Kitchen and Porch.
    pub(super) fn entries(n: usize) -> Vec<LogEntry> {
        (0..n)
            .map(|i| {
                let location = if i % 2 == 0 { "Kitchen" } else { "Porch" };
                entry(IssueType::all()[i % 3], location, i64::try_from(i).unwrap() + 1)
            })
            .collect()
    }

    pub(super) fn exporter() -> ReportExporter<FixedOffset> {
        ReportExporter::at(now(), Timeframe::Month, Region::Us)
    }

    #[test]
    fn test_empty_entries_export_nothing() {
        let profile = UserProfile::default();
        assert_eq!(exporter().to_csv(&[], &profile).unwrap(), Export::NothingToExport);
        assert_eq!(
            exporter().to_printable_report(&[], &profile),
            Export::NothingToExport
        );
        assert!(exporter()
            .export(Format::Html, &[], &profile)
            .unwrap()
            .into_content()
            .is_none());
    }

    #[test]
    fn test_context_matches_analyzer() {
        let entries = entries(5);
        let profile = UserProfile::default();
        let exporter = exporter();
        let ctx = exporter.context(&entries, &profile);
        let analyzer = PatternAnalyzer::at(&entries, Timeframe::Month, now());

        assert_eq!(ctx.window_total, analyzer.total());
        assert_eq!(ctx.tier, Tier::Fair);
        assert_eq!(ctx.affected_locations, ["Kitchen", "Porch"]);
        assert_eq!(ctx.most_common, Some(IssueType::NoSignal));
        let keys: Vec<_> = ctx.type_counts.iter().map(|s| s.issue_type).collect();
        assert_eq!(keys, IssueType::all());
    }

    #[test]
    fn test_window_excludes_old_entries_from_numbers() {
        let mut entries = entries(2);
        entries.push(entry(IssueType::NoSignal, "Attic", 24 * 60));
        let profile = UserProfile::default();
        let exporter = exporter();
        let ctx = exporter.context(&entries, &profile);

        assert_eq!(ctx.window_total, 2);
        assert_eq!(ctx.tier, Tier::Light);
        assert_eq!(ctx.entries.len(), 3);
    }

    #[test]
    fn test_profile_region_overrides_default() {
        let entries = entries(1);
        let profile = UserProfile {
            region: Some(Region::Gb),
            ..UserProfile::default()
        };
        let exporter = exporter();
        let ctx = exporter.context(&entries, &profile);
        assert_eq!(ctx.labels.provider_label, "Network Operator");
        assert_eq!(ctx.entry_stamp(&entries[0]).0, "15/06/2024");
    }

    #[test]
    fn test_issue_frequency_wording() {
        let profile = UserProfile::default();
        let exporter = exporter();

        let one = entries(1);
        assert_eq!(exporter.context(&one, &profile).issue_frequency(), "1 issue this month");
        let many = entries(4);
        assert_eq!(exporter.context(&many, &profile).issue_frequency(), "4 issues this month");

        let old = vec![entry(IssueType::NoSignal, "Attic", 24 * 60)];
        let ctx = exporter.context(&old, &profile);
        assert_eq!(ctx.issue_frequency(), "No issues reported this month");
        assert_eq!(ctx.most_common_label(), "None");
    }

    #[test]
    fn test_reference_has_six_digits() {
        let entries = entries(1);
        let profile = UserProfile::default();
        let exporter = exporter();
        let reference = exporter.context(&entries, &profile).reference();
        assert!(reference.starts_with("SR-"));
        assert_eq!(reference.len(), 9);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            Format::Csv.file_name(&now()),
            "signal-connection-report-2024-06-15.csv"
        );
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("12 Mill Lane\r\nSpringfield\n"), "12 Mill Lane Springfield");
        assert_eq!(single_line("plain"), "plain");
        assert_eq!(single_line("Flat 2\rHigh Street"), "Flat 2 High Street");
    }
}
