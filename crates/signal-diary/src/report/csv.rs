//! Sectioned CSV rendering.
//!
//! Sections are separated by a blank line. Column order of the detailed log
//! is `Date,Time,Issue Type,Location[,Notes]`; spreadsheets downstream rely
//! on it.

use std::fmt::Display;

use ::csv::{QuoteStyle, WriterBuilder};
use chrono::TimeZone;

use super::{single_line, ReportContext};
use crate::error::{Error, Result};

/// Render `ctx` as CSV text.
pub(super) fn render<Tz: TimeZone>(ctx: &ReportContext<'_, Tz>) -> Result<String>
where
    Tz::Offset: Display,
{
    let sections = [
        status_section(ctx),
        customer_section(ctx),
        summary_section(ctx),
        log_section(ctx),
    ];

    let mut out = String::new();
    for rows in sections.iter().filter(|rows| !rows.is_empty()) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&write_rows(rows)?);
    }
    Ok(out)
}

type Rows = Vec<Vec<String>>;

fn row<const N: usize>(fields: [&str; N]) -> Vec<String> {
    fields.iter().map(ToString::to_string).collect()
}

fn write_rows(rows: &Rows) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());
    for record in rows {
        writer.write_record(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::internal(format!("CSV output is not UTF-8: {e}")))
}

fn status_section<Tz: TimeZone>(ctx: &ReportContext<'_, Tz>) -> Rows
where
    Tz::Offset: Display,
{
    vec![
        row(["CONNECTION STATUS REPORT"]),
        row(["Report Generated", &ctx.generated_stamp()]),
        row(["Connection Status", ctx.tier.label()]),
        row(["Issue Frequency", &ctx.issue_frequency()]),
        row(["Most Common Issue", ctx.most_common_label()]),
        row(["Affected Locations", &ctx.affected_locations.join("; ")]),
    ]
}

fn customer_section<Tz: TimeZone>(ctx: &ReportContext<'_, Tz>) -> Rows {
    let profile = ctx.profile;
    let mut rows = Vec::new();

    for (label, value) in [
        ("Name", &profile.name),
        ("Phone Number", &profile.phone_number),
        ("Address", &profile.address),
    ] {
        let value = single_line(value);
        if !value.is_empty() {
            rows.push(vec![label.to_string(), value]);
        }
    }

    if let Some(provider) = &ctx.provider {
        let label = ctx.labels.provider_label;
        rows.push(vec![label.to_string(), provider.name.clone()]);
        if let Some(email) = &provider.support_email {
            rows.push(vec![format!("{label} Support Email"), email.clone()]);
        }
        if let Some(phone) = &provider.support_phone {
            rows.push(vec![format!("{label} Support Phone"), phone.clone()]);
        }
    }

    if !rows.is_empty() {
        rows.insert(0, row(["CUSTOMER INFORMATION"]));
    }
    rows
}

fn summary_section<Tz: TimeZone>(ctx: &ReportContext<'_, Tz>) -> Rows {
    let mut rows = vec![
        row(["ISSUE SUMMARY"]),
        row(["Reporting Period", ctx.timeframe.period()]),
        row(["Total Issues", &ctx.window_total.to_string()]),
    ];
    for stat in &ctx.type_counts {
        rows.push(vec![
            format!("{} Issues", ctx.labels.issue_label(stat.issue_type)),
            stat.count.to_string(),
        ]);
    }
    rows
}

fn log_section<Tz: TimeZone>(ctx: &ReportContext<'_, Tz>) -> Rows
where
    Tz::Offset: Display,
{
    let with_notes = ctx.has_notes();
    let mut header = row(["Date", "Time", "Issue Type", "Location"]);
    if with_notes {
        header.push("Notes".to_string());
    }

    let mut rows = vec![row(["DETAILED ISSUE LOG"]), header];
    for &entry in &ctx.entries {
        let (date, time) = ctx.entry_stamp(entry);
        let mut record = vec![
            date,
            time,
            ctx.labels.issue_label(entry.issue_type).to_string(),
            single_line(&entry.location),
        ];
        if with_notes {
            record.push(entry.notes.as_deref().map(single_line).unwrap_or_default());
        }
        rows.push(record);
    }
    rows
}

#[cfg(test)]
mod tests {
    use ::csv::{ReaderBuilder, StringRecord};

    use super::super::tests::{entries, entry, exporter};
    use super::super::Export;
    use crate::entry::{IssueType, LogEntry};
    use crate::profile::UserProfile;

    fn render(entries: &[LogEntry], profile: &UserProfile) -> String {
        match exporter().to_csv(entries, profile).unwrap() {
            Export::Ready(text) => text,
            Export::NothingToExport => panic!("expected a document"),
        }
    }

    fn parse(text: &str) -> Vec<StringRecord> {
        ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes())
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_location_with_comma_round_trips() {
        let entries = vec![entry(IssueType::NoSignal, "Kitchen, near window", 1)];
        let records = parse(&render(&entries, &UserProfile::default()));

        let header = records.iter().position(|r| &r[0] == "Date").unwrap();
        assert_eq!(&records[header + 1][3], "Kitchen, near window");
    }

    #[test]
    fn test_quotes_and_newlines_are_escaped() {
        let mut entry = entry(IssueType::CallFailed, "Porch", 1);
        entry.notes = Some("said \"no service\"\nthen dropped".to_string());
        let records = parse(&render(&[entry], &UserProfile::default()));

        let last = records.last().unwrap();
        assert_eq!(&last[4], "said \"no service\" then dropped");
    }

    #[test]
    fn test_sections_in_order() {
        let profile = UserProfile {
            name: "Ada".to_string(),
            ..UserProfile::default()
        };
        let text = render(&entries(3), &profile);
        let positions: Vec<_> = [
            "CONNECTION STATUS REPORT",
            "CUSTOMER INFORMATION",
            "ISSUE SUMMARY",
            "DETAILED ISSUE LOG",
        ]
        .iter()
        .map(|heading| text.find(heading).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_customer_section_omitted_without_profile() {
        let text = render(&entries(2), &UserProfile::default());
        assert!(!text.contains("CUSTOMER INFORMATION"));
    }

    #[test]
    fn test_customer_section_has_only_present_fields() {
        let profile = UserProfile {
            address: "12 Mill Lane\nSpringfield".to_string(),
            network_provider: "att".to_string(),
            ..UserProfile::default()
        };
        let records = parse(&render(&entries(1), &profile));
        let first_fields: Vec<_> = records.iter().map(|r| r[0].to_string()).collect();

        assert!(!first_fields.contains(&"Name".to_string()));
        let address = records.iter().find(|r| &r[0] == "Address").unwrap();
        assert_eq!(&address[1], "12 Mill Lane Springfield");
        let provider = records.iter().find(|r| &r[0] == "Network Provider").unwrap();
        assert_eq!(&provider[1], "AT&T");
        assert!(first_fields.contains(&"Network Provider Support Phone".to_string()));
    }

    #[test]
    fn test_status_and_summary_numbers() {
        let records = parse(&render(&entries(5), &UserProfile::default()));
        let value = |key: &str| {
            records
                .iter()
                .find(|r| &r[0] == key)
                .map(|r| r[1].to_string())
                .unwrap()
        };

        assert_eq!(value("Connection Status"), "Fair - Moderate Issues");
        assert_eq!(value("Issue Frequency"), "5 issues this month");
        assert_eq!(value("Most Common Issue"), "No Signal");
        assert_eq!(value("Affected Locations"), "Kitchen; Porch");
        assert_eq!(value("Total Issues"), "5");
        assert_eq!(value("No Signal Issues"), "2");
        assert_eq!(value("Message Didn't Send Issues"), "1");
    }

    #[test]
    fn test_notes_column_only_when_any_entry_has_notes() {
        let text = render(&entries(2), &UserProfile::default());
        assert!(text.contains("\"Date\",\"Time\",\"Issue Type\",\"Location\"\n"));
        assert!(!text.contains("Notes"));

        let mut with_note = entries(2);
        with_note[1].notes = Some("inside".to_string());
        let records = parse(&render(&with_note, &UserProfile::default()));
        let header = records.iter().find(|r| &r[0] == "Date").unwrap();
        assert_eq!(header.len(), 5);
        assert_eq!(&records.last().unwrap()[4], "inside");
    }

    #[test]
    fn test_detail_rows_newest_first_with_us_formats() {
        let records = parse(&render(&entries(2), &UserProfile::default()));
        let header = records.iter().position(|r| &r[0] == "Date").unwrap();
        assert_eq!(&records[header + 1][0], "06/15/2024");
        assert_eq!(&records[header + 1][1], "05:30 PM");
        assert_eq!(&records[header + 2][1], "04:30 PM");
    }

    #[test]
    fn test_detail_rows_sorted_whatever_the_input_order() {
        let entries = vec![
            entry(IssueType::NoSignal, "Oldest", 5),
            entry(IssueType::NoSignal, "Middle", 3),
            entry(IssueType::NoSignal, "Newest", 1),
        ];
        let records = parse(&render(&entries, &UserProfile::default()));
        let header = records.iter().position(|r| &r[0] == "Date").unwrap();
        let locations: Vec<_> = records[header + 1..].iter().map(|r| r[3].to_string()).collect();
        assert_eq!(locations, ["Newest", "Middle", "Oldest"]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let first = entry(IssueType::NoSignal, "First", 2);
        let mut second = entry(IssueType::CallFailed, "Second", 2);
        second.timestamp = first.timestamp;
        let records = parse(&render(&[first, second], &UserProfile::default()));
        let header = records.iter().position(|r| &r[0] == "Date").unwrap();
        assert_eq!(&records[header + 1][3], "First");
        assert_eq!(&records[header + 2][3], "Second");
    }

    #[test]
    fn test_text_fields_quoted_counts_bare() {
        let text = render(&entries(1), &UserProfile::default());
        assert!(text.contains("\"Connection Status\",\"Good\"\n"));
        assert!(text.contains("\"Total Issues\",1\n"));
        assert!(text.contains(",\"No Signal\",\"Kitchen\"\n"));
    }
}
