//! Report command for viewing time per workspace.
//!
//! This module implements `spacetime report` over an arbitrary date range
//! (default: the last seven days) with daily, weekly, monthly or yearly
//! buckets, and renders a stacked bar chart plus a totals table or JSON.

use std::fmt::Write;

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use st_core::{
    AggregatedSeries, BucketKey, DailyTotals, Granularity, WorkspaceTotal, build_series,
    build_totals,
};

use crate::commands::util::format_time;

/// Days before `end` that the default range starts.
const DEFAULT_RANGE_DAYS: i64 = 7;

/// Width of chart bars in characters.
const BAR_WIDTH: usize = 20;

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub timezone: String,
    pub series: AggregatedSeries,
    pub totals: Vec<WorkspaceTotal>,
}

impl ReportData {
    fn current_year(&self) -> i32 {
        self.generated_at.with_timezone(&Local).year()
    }
}

/// Fills in a missing range end with `today` and a missing start with a week
/// before the end.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or(end - Duration::days(DEFAULT_RANGE_DAYS));
    (start, end)
}

/// Runs both aggregation queries over a totals snapshot.
pub fn generate_report_data(
    totals: &DailyTotals,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    generated_at: DateTime<Utc>,
) -> ReportData {
    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());

    ReportData {
        generated_at,
        start,
        end,
        granularity,
        timezone,
        series: build_series(totals, start, end, granularity),
        totals: build_totals(totals, start, end),
    }
}

// ========== Chart Bars ==========

/// Generates a fixed-width bar.
/// Values <5% of max get a single block for visibility.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return "░".repeat(BAR_WIDTH);
    }

    let ratio = value / max;
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        #[allow(clippy::cast_precision_loss)]
        let width = BAR_WIDTH as f64;
        (ratio * width).round().clamp(0.0, width) as usize
    };

    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

// ========== Text Output ==========

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();
    let current_year = data.current_year();

    writeln!(
        output,
        "SPACETIME REPORT: {} to {} ({})",
        data.start.format("%b %-d, %Y"),
        data.end.format("%b %-d, %Y"),
        data.granularity
    )
    .unwrap();

    if data.series.labels.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "Empty date range: start is after end.").unwrap();
        return output;
    }

    if data.totals.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No workspace time recorded yet.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: Pipe editor events into 'spacetime track' to start tracking."
        )
        .unwrap();
        return output;
    }

    let labels: Vec<String> = data
        .series
        .labels
        .iter()
        .map(|key| key.label(current_year))
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let name_width = data
        .totals
        .iter()
        .map(|row| row.workspace.chars().count())
        .max()
        .unwrap_or(0);

    let bucket_totals = data.series.bucket_totals();
    let max_bucket = bucket_totals.iter().copied().fold(0.0, f64::max);

    // CHART section
    writeln!(output).unwrap();
    writeln!(output, "CHART").unwrap();
    writeln!(output, "─────").unwrap();

    for (index, label) in labels.iter().enumerate() {
        let total = bucket_totals[index];
        writeln!(
            output,
            "{label:<label_width$}  {}  {}",
            progress_bar(total, max_bucket),
            format_time(total)
        )
        .unwrap();

        for (workspace, values) in &data.series.series {
            let seconds = values[index];
            if seconds > 0.0 {
                writeln!(
                    output,
                    "    {workspace:<name_width$}  {}",
                    format_time(seconds)
                )
                .unwrap();
            }
        }
    }

    // TOTALS section
    let name_width = name_width.max("Workspace".len());
    writeln!(output).unwrap();
    writeln!(output, "TOTALS").unwrap();
    writeln!(output, "──────").unwrap();
    writeln!(output, "{:<name_width$}  Time Spent", "Workspace").unwrap();
    for row in &data.totals {
        writeln!(
            output,
            "{:<name_width$}  {}",
            row.workspace,
            format_time(row.total_seconds)
        )
        .unwrap();
    }
    let grand_total: f64 = data.totals.iter().map(|row| row.total_seconds).sum();
    writeln!(output, "{:<name_width$}  {}", "Total", format_time(grand_total)).unwrap();

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub timezone: &'a str,
    pub period: JsonPeriod,
    pub labels: &'a [BucketKey],
    pub display_labels: Vec<String>,
    pub series: &'a IndexMap<String, Vec<f64>>,
    pub totals: &'a [WorkspaceTotal],
}

#[derive(Debug, Serialize)]
pub struct JsonPeriod {
    pub start: String,
    pub end: String,
    pub granularity: Granularity,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let current_year = data.current_year();
    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: &data.timezone,
        period: JsonPeriod {
            start: data.start.format("%Y-%m-%d").to_string(),
            end: data.end.format("%Y-%m-%d").to_string(),
            granularity: data.granularity,
        },
        labels: &data.series.labels,
        display_labels: data
            .series
            .labels
            .iter()
            .map(|key| key.label(current_year))
            .collect(),
        series: &data.series.series,
        totals: &data.totals,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command against a totals snapshot.
pub fn run<W: std::io::Write>(
    writer: &mut W,
    totals: &DailyTotals,
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    json: bool,
) -> Result<()> {
    if start > end {
        tracing::warn!(%start, %end, "report range is inverted");
    }
    let data = generate_report_data(totals, start, end, granularity, Utc::now());

    if json {
        writeln!(writer, "{}", format_report_json(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insta::assert_snapshot;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_totals() -> DailyTotals {
        let mut totals = DailyTotals::new();
        totals.add("alpha", date(2024, 1, 15), 1200.0);
        totals.add("alpha", date(2024, 1, 17), 600.0);
        totals.add("beta", date(2024, 1, 16), 3600.0);
        totals
    }

    fn report(totals: &DailyTotals, start: NaiveDate, end: NaiveDate, granularity: Granularity) -> ReportData {
        let mut data = generate_report_data(
            totals,
            start,
            end,
            granularity,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        );
        data.timezone = "UTC".to_string();
        data
    }

    // ========== Range Tests ==========

    #[test]
    fn test_default_range_is_last_seven_days() {
        let today = date(2024, 1, 15);
        assert_eq!(resolve_range(None, None, today), (date(2024, 1, 8), today));
    }

    #[test]
    fn test_default_start_follows_explicit_end() {
        let today = date(2024, 1, 15);
        assert_eq!(
            resolve_range(None, Some(date(2024, 1, 10)), today),
            (date(2024, 1, 3), date(2024, 1, 10))
        );
        assert_eq!(
            resolve_range(Some(date(2023, 1, 1)), None, today),
            (date(2023, 1, 1), today)
        );
    }

    // ========== Progress Bar Tests ==========

    #[test]
    fn test_progress_bar_full() {
        assert_eq!(progress_bar(100.0, 100.0), "████████████████████");
    }

    #[test]
    fn test_progress_bar_partial() {
        assert_eq!(progress_bar(50.0, 100.0), "██████████░░░░░░░░░░");
        assert_eq!(progress_bar(1200.0, 3600.0), "███████░░░░░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_minimum() {
        assert_eq!(progress_bar(1.0, 100.0), "█░░░░░░░░░░░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_zero() {
        assert_eq!(progress_bar(0.0, 0.0), "░░░░░░░░░░░░░░░░░░░░");
        assert_eq!(progress_bar(0.0, 100.0), "░░░░░░░░░░░░░░░░░░░░");
    }

    // ========== Report Output Tests ==========

    #[test]
    fn test_report_daily() {
        let data = report(&sample_totals(), date(2024, 1, 15), date(2024, 1, 17), Granularity::Daily);
        assert_snapshot!(format_report(&data), @r"
        SPACETIME REPORT: Jan 15, 2024 to Jan 17, 2024 (daily)

        CHART
        ─────
        Jan 15  ███████░░░░░░░░░░░░░  00:20:00
            alpha  00:20:00
        Jan 16  ████████████████████  01:00:00
            beta   01:00:00
        Jan 17  ███░░░░░░░░░░░░░░░░░  00:10:00
            alpha  00:10:00

        TOTALS
        ──────
        Workspace  Time Spent
        alpha      00:30:00
        beta       01:00:00
        Total      01:30:00
        ");
    }

    #[test]
    fn test_report_weekly_previous_year() {
        let mut totals = DailyTotals::new();
        totals.add("alpha", date(2023, 1, 2), 45.0);
        let data = report(&totals, date(2023, 1, 1), date(2023, 1, 2), Granularity::Weekly);
        assert_snapshot!(format_report(&data), @r"
        SPACETIME REPORT: Jan 1, 2023 to Jan 2, 2023 (weekly)

        CHART
        ─────
        Week of Dec 26, 2022  ░░░░░░░░░░░░░░░░░░░░  00:00:00
        Week of Jan 2, 2023   ████████████████████  00:00:45
            alpha  00:00:45

        TOTALS
        ──────
        Workspace  Time Spent
        alpha      00:00:45
        Total      00:00:45
        ");
    }

    #[test]
    fn test_report_empty_store() {
        let data = report(&DailyTotals::new(), date(2024, 1, 8), date(2024, 1, 15), Granularity::Daily);
        let output = format_report(&data);
        assert!(output.contains("No workspace time recorded yet."));
        assert!(output.contains("spacetime track"));
    }

    #[test]
    fn test_report_inverted_range() {
        let data = report(&sample_totals(), date(2024, 1, 17), date(2024, 1, 15), Granularity::Daily);
        let output = format_report(&data);
        assert!(output.contains("start is after end"));
        assert!(!output.contains("TOTALS"));
    }

    #[test]
    fn test_report_json_output() {
        let data = report(&sample_totals(), date(2024, 1, 15), date(2024, 1, 21), Granularity::Weekly);
        let json: serde_json::Value = serde_json::from_str(&format_report_json(&data).unwrap()).unwrap();

        assert_eq!(json["period"]["granularity"], "weekly");
        assert_eq!(json["period"]["start"], "2024-01-15");
        assert_eq!(json["labels"], serde_json::json!(["2024-01-15"]));
        assert_eq!(json["display_labels"], serde_json::json!(["Week of Jan 15"]));
        assert_eq!(json["series"]["alpha"], serde_json::json!([1800.0]));
        assert_eq!(json["series"]["beta"], serde_json::json!([3600.0]));
        assert_eq!(json["totals"][1]["workspace"], "beta");
        assert_eq!(json["totals"][1]["total_seconds"], 3600.0);
        assert_eq!(json["timezone"], "UTC");
    }

    #[test]
    fn test_run_writes_text() {
        let mut out = Vec::new();
        run(
            &mut out,
            &sample_totals(),
            date(2024, 1, 1),
            date(2024, 12, 31),
            Granularity::Monthly,
            false,
        )
        .unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.starts_with("SPACETIME REPORT: Jan 1, 2024 to Dec 31, 2024 (monthly)"));
        assert!(output.contains("Total      01:30:00"));
    }
}
