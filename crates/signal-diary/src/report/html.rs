//! Printable HTML rendering.
//!
//! The document is self-contained: inline styles, no scripts, no external
//! resources. Section order is fixed: status, customer, provider support,
//! issue summary, advisory, detailed log, footer.

use std::fmt::Display;

use chrono::TimeZone;

use super::ReportContext;
use crate::classify::Tier;

const STYLE: &str = "body{font-family:Arial,sans-serif;margin:40px;line-height:1.6;color:#1e293b}\
h1{margin:0;color:#fff}\
h2{color:#475569;margin-top:30px;border-bottom:1px solid #e2e8f0;padding-bottom:5px}\
h3{color:#64748b;margin-top:20px}\
table{width:100%;border-collapse:collapse;margin-top:20px}\
th,td{border:1px solid #e2e8f0;padding:12px;text-align:left}\
th{background-color:#f8fafc}\
.report-header{background-color:#1e293b;color:#fff;padding:20px;border-radius:8px;margin-bottom:20px}\
.connection-status{padding:20px;border-radius:8px;margin:20px 0;border:2px solid}\
.status-good{border-color:#16a34a;background-color:#f0fdf4}\
.status-light{border-color:#65a30d;background-color:#f7fee7}\
.status-fair{border-color:#d97706;background-color:#fffbeb}\
.status-poor{border-color:#dc2626;background-color:#fef2f2}\
.status-indicator{display:inline-block;padding:5px 15px;border-radius:20px;font-weight:bold;margin-left:10px;color:#fff}\
.user-info{background-color:#f0f9ff;padding:20px;border-radius:8px;margin:20px 0;border:2px solid #0ea5e9}\
.provider-info{background-color:#f0fdf4;padding:15px;border-radius:8px;margin:10px 0;border-left:4px solid #22c55e}\
.summary{background-color:#fef7ed;padding:20px;border-radius:8px;margin:20px 0}\
.advisory{padding:15px;border-radius:8px;margin:20px 0;border-left:4px solid}\
.advisory-fair{background-color:#fffbeb;border-left-color:#d97706}\
.advisory-poor{background-color:#fef2f2;border-left-color:#dc2626}\
.footer{margin-top:40px;font-size:12px;color:#64748b;border-top:1px solid #e2e8f0;padding-top:20px}";

/// Render `ctx` as a complete HTML document.
pub(super) fn render<Tz: TimeZone>(ctx: &ReportContext<'_, Tz>) -> String
where
    Tz::Offset: Display,
{
    let mut s = String::new();
    s.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    s.push_str("<title>Network Connection Report</title><style>");
    s.push_str(STYLE);
    s.push_str("</style></head><body>");

    s.push_str("<div class=\"report-header\"><h1>Network Connection Report</h1>");
    s.push_str(&format!(
        "<p><strong>Generated:</strong> {}</p></div>",
        html_escape(&ctx.generated_stamp())
    ));

    status_block(&mut s, ctx);
    customer_block(&mut s, ctx);
    provider_block(&mut s, ctx);
    summary_block(&mut s, ctx);
    advisory_block(&mut s, ctx);
    log_table(&mut s, ctx);
    footer(&mut s, ctx);

    s.push_str("</body></html>\n");
    s
}

fn status_block<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>) {
    let tier = ctx.tier;
    s.push_str(&format!(
        "<div class=\"connection-status {}\"><h2>Connection Status Assessment</h2>",
        tier.css_class()
    ));
    s.push_str(&format!(
        "<p><strong>Overall Status:</strong> {}<span class=\"status-indicator\" style=\"background-color:{}\">{}</span></p>",
        tier.label(),
        tier.color(),
        tier.indicator()
    ));
    s.push_str(&format!(
        "<p><strong>Issue Frequency:</strong> {}</p>",
        ctx.issue_frequency()
    ));
    s.push_str(&format!(
        "<p><strong>Most Common Issue:</strong> {}</p>",
        html_escape(ctx.most_common_label())
    ));
    if !ctx.affected_locations.is_empty() {
        s.push_str(&format!(
            "<p><strong>Affected Locations:</strong> {}</p>",
            html_escape(&ctx.affected_locations.join(", "))
        ));
    }
    s.push_str("</div>");
}

fn customer_block<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>) {
    let profile = ctx.profile;
    if !profile.has_contact_details() {
        return;
    }

    s.push_str("<div class=\"user-info\"><h2>Customer Information</h2>");
    paragraph(s, "Name", &html_escape(profile.name.trim()));
    paragraph(s, "Phone Number", &html_escape(profile.phone_number.trim()));
    let address = profile
        .address
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(html_escape)
        .collect::<Vec<_>>()
        .join("<br>");
    paragraph(s, "Address", &address);
    if let Some(provider) = &ctx.provider {
        paragraph(s, ctx.labels.provider_label, &html_escape(&provider.name));
    }
    s.push_str("</div>");
}

fn provider_block<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>) {
    let Some(provider) = &ctx.provider else {
        return;
    };

    s.push_str(&format!(
        "<div class=\"provider-info\"><h3>{} Support Information</h3>",
        ctx.labels.provider_label
    ));
    paragraph(s, "Provider", &html_escape(&provider.name));
    if let Some(phone) = &provider.support_phone {
        paragraph(s, "Support Phone", &html_escape(phone));
    }
    if let Some(email) = &provider.support_email {
        paragraph(s, "Support Email", &html_escape(email));
    }
    s.push_str(
        "<p><em>Please reference this report when contacting support for faster resolution.</em></p></div>",
    );
}

fn summary_block<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>) {
    s.push_str("<div class=\"summary\"><h2>Issue Summary</h2>");
    paragraph(s, "Reporting Period", ctx.timeframe.period());
    paragraph(s, "Total Issues", &ctx.window_total.to_string());
    for stat in &ctx.type_counts {
        let label = format!("{} Issues", ctx.labels.issue_label(stat.issue_type));
        paragraph(s, &html_escape(&label), &stat.count.to_string());
    }
    s.push_str("</div>");
}

fn advisory_block<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>) {
    if !ctx.tier.is_urgent() {
        return;
    }
    let total = ctx.window_total;
    let period = ctx.timeframe.period();
    if ctx.tier == Tier::Poor {
        s.push_str("<div class=\"advisory advisory-poor\"><h3>Network Performance Alert</h3>");
        s.push_str(&format!(
            "<p><strong>This customer has logged {total} connectivity issues {period}.</strong></p>"
        ));
        s.push_str(
            "<p>Recommended Actions:</p><ul>\
             <li>Investigate network coverage in reported locations</li>\
             <li>Check for tower maintenance or outages</li>\
             <li>Consider signal booster recommendations</li>\
             <li>Schedule technical support follow-up</li>\
             </ul></div>",
        );
    } else {
        s.push_str("<div class=\"advisory advisory-fair\"><h3>Connection Issues Under Monitoring</h3>");
        s.push_str(&format!(
            "<p>This customer has reported {total} connectivity issues {period}. \
             While not yet critical, monitoring is recommended to prevent escalation.</p></div>"
        ));
    }
}

fn log_table<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>)
where
    Tz::Offset: Display,
{
    let with_notes = ctx.has_notes();
    s.push_str("<h2>Detailed Issue Log</h2><table><thead><tr>");
    s.push_str("<th>Date</th><th>Time</th><th>Issue Type</th><th>Location</th>");
    if with_notes {
        s.push_str("<th>Notes</th>");
    }
    s.push_str("</tr></thead><tbody>");

    for &entry in &ctx.entries {
        let (date, time) = ctx.entry_stamp(entry);
        s.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            html_escape(&date),
            html_escape(&time),
            html_escape(ctx.labels.issue_label(entry.issue_type)),
            html_escape(&entry.location)
        ));
        if with_notes {
            s.push_str(&format!(
                "<td>{}</td>",
                html_escape(entry.notes.as_deref().unwrap_or(""))
            ));
        }
        s.push_str("</tr>");
    }
    s.push_str("</tbody></table>");
}

fn footer<Tz: TimeZone>(s: &mut String, ctx: &ReportContext<'_, Tz>) {
    s.push_str("<div class=\"footer\"><h3>Report Usage Instructions</h3>");
    s.push_str(&format!(
        "<p><strong>For {} Technical Support:</strong></p><ul>\
         <li>Use customer information above to locate account</li>\
         <li>Reference connection status and affected locations for investigation</li>\
         <li>Consider the issue frequency when prioritizing support tickets</li></ul>",
        ctx.labels.provider_label
    ));
    s.push_str(&format!(
        "<p><strong>For Customer/Caregiver:</strong></p><ul>\
         <li>Share this complete report with your provider's customer service</li>\
         <li>Reference the report number: {}</li>\
         <li>Keep a copy for your records</li></ul>",
        ctx.reference()
    ));
    s.push_str(
        "<p><em>This report was generated by Signal Diary, a tool for tracking and reporting \
         mobile connectivity issues.</em></p></div>",
    );
}

/// Append `<p><strong>label:</strong> value</p>` when `value` is non-empty.
/// Both arguments must already be escaped.
fn paragraph(s: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    s.push_str(&format!("<p><strong>{label}:</strong> {value}</p>"));
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
