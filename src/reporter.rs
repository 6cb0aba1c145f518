use crate::analyzer::{Aggregates, ranked, top_n};
use crate::model::CleanReport;

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

/// Run facts the report shows next to the aggregates.
pub struct ReportContext<'a> {
    pub location: &'a str,
    pub top_n: usize,
    pub clean: &'a CleanReport,
}

/// `Active: 66.7%, Dissolved: 33.3%`, largest share first.
pub fn status_breakdown_line(aggs: &Aggregates) -> String {
    aggs.status_percentages()
        .iter()
        .map(|(status, pct)| format!("{}: {:.1}%", status.label(), pct))
        .collect::<Vec<_>>()
        .join(", ")
}

fn counts_line<K: Clone + Ord>(entries: Vec<(K, usize)>, label: impl Fn(&K) -> String) -> String {
    if entries.is_empty() {
        return "n/a".to_string();
    }
    entries
        .iter()
        .map(|(k, c)| format!("{} ({})", label(k), c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats the summary report. Only reads the aggregates, computes nothing new.
pub fn render_summary(aggs: &Aggregates, ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    let n = ctx.top_n;
    let na = || "n/a".to_string();

    // writing into a String cannot fail
    let _ = writeln!(out, "Healthcare Agencies Analysis Summary - {}", ctx.location);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);
    let _ = writeln!(out, "Location: {}", ctx.location);
    let _ = writeln!(out, "Analysis Date: {}", aggs.today.format("%Y-%m-%d"));
    let _ = writeln!(out, "Total Companies: {}", aggs.total);
    let _ = writeln!(out, "Total Active Companies: {}", aggs.active_count());
    let _ = writeln!(out, "Total Inactive Companies: {}", aggs.total - aggs.active_count());
    let _ = writeln!(out, "Status Breakdown: {}", {
        let line = status_breakdown_line(aggs);
        if line.is_empty() { na() } else { line }
    });
    let _ = writeln!(
        out,
        "Date Range: {}",
        aggs.year_range
            .map(|(first, last)| format!("{} - {}", first, last))
            .unwrap_or_else(na)
    );
    let _ = writeln!(
        out,
        "Average Company Age: {}",
        aggs.average_age_years
            .map(|age| format!("{:.2} years", age))
            .unwrap_or_else(na)
    );
    let _ = writeln!(
        out,
        "Most Common Company Type: {}",
        ranked(&aggs.by_type)
            .first()
            .map(|(t, _)| t.label())
            .unwrap_or_else(na)
    );
    let _ = writeln!(
        out,
        "Top {} Company Types: {}",
        n,
        counts_line(top_n(&aggs.by_type, n), |t| t.label())
    );
    let _ = writeln!(
        out,
        "Top {} Postal Code Areas: {}",
        n,
        counts_line(top_n(&aggs.by_postal_prefix, n), |k| k.clone())
    );
    let _ = writeln!(
        out,
        "Top {} SIC Codes: {}",
        n,
        counts_line(top_n(&aggs.by_sic, n), |k| k.clone())
    );
    let _ = writeln!(
        out,
        "Recent Incorporations (Last 2 Years): {}",
        aggs.recent_incorporations
    );
    let _ = writeln!(out, "Growth Rate (Last 5 Years): {:.2}%", aggs.growth_rate);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Rows Read: {}, Dropped: {} (missing number {}, missing name {}, duplicate {}, malformed {}), Dates Flagged: {}",
        ctx.clean.rows_read,
        ctx.clean.dropped() + ctx.clean.malformed_rows,
        ctx.clean.missing_number,
        ctx.clean.missing_name,
        ctx.clean.duplicates,
        ctx.clean.malformed_rows,
        ctx.clean.unparsed_dates
    );
    out
}

pub fn write_summary(path: &Path, report: &str) -> io::Result<()> {
    fs::write(path, report)?;
    info!("Summary report saved to: {}", path.display());
    Ok(())
}
