//! Results reporting and formatting.

use crate::config::BenchConfig;
use crate::metrics::RunTotals;
use crate::runner::SeedReport;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::{Deserialize, Serialize};
use storage::PoolStats;

/// End-of-run summary, printed when a run is stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchSummary {
    pub timestamp: String,
    pub name: String,
    pub addr: String,
    pub key: String,
    pub concurrency: u32,
    pub sleep_us: u64,

    // Seeding
    pub seeded: u64,
    pub seed_failures: u64,
    pub seed_secs: f64,

    // Benchmark
    pub duration_secs: f64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub average_qps: f64,
    pub peak_qps: u64,
    pub error_rate: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

impl BenchSummary {
    pub fn new(config: &BenchConfig, seed: SeedReport, totals: RunTotals) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            name: config.name.clone(),
            addr: config.addr.clone(),
            key: seed.key,
            concurrency: config.concurrency,
            sleep_us: config.sleep_us,
            seeded: seed.inserted,
            seed_failures: seed.failed,
            seed_secs: seed.elapsed.as_secs_f64(),
            duration_secs: totals.elapsed.as_secs_f64(),
            total_requests: totals.requests,
            total_errors: totals.errors,
            average_qps: totals.average_qps(),
            peak_qps: totals.peak_qps,
            error_rate: totals.error_rate(),
            pool: None,
        }
    }
}

/// Output format for the end-of-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown output format '{}' (table, json, csv)", other)),
        }
    }
}

/// Formats run summaries for output.
pub struct ResultsReport;

impl ResultsReport {
    pub fn render(summary: &BenchSummary, format: OutputFormat) -> anyhow::Result<String> {
        Ok(match format {
            OutputFormat::Table => Self::format_table(summary),
            OutputFormat::Json => Self::format_json(summary)?,
            OutputFormat::Csv => format!("{}\n{}", Self::csv_header(), Self::format_csv(summary)),
        })
    }

    /// Format results as a console table.
    pub fn format_table(summary: &BenchSummary) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![format!("GEORADIUS Load Test: {}", summary.name)]);

        table.add_row(vec!["Store:", &summary.addr]);
        table.add_row(vec!["Key:", &summary.key]);
        table.add_row(vec!["Concurrency:", &format!("{}", summary.concurrency)]);
        table.add_row(vec!["Sleep:", &format!("{}µs", summary.sleep_us)]);

        table.add_row(vec!["", ""]);
        table.add_row(vec![
            "Seeded:",
            &format!(
                "{} ({} failed) in {:.1}s",
                summary.seeded, summary.seed_failures, summary.seed_secs
            ),
        ]);

        table.add_row(vec!["", ""]);
        table.add_row(vec!["Duration:", &format!("{:.1}s", summary.duration_secs)]);
        table.add_row(vec![
            "Total Requests:",
            &format!("{}", summary.total_requests),
        ]);
        table.add_row(vec![
            "Errors:",
            &format!("{} ({:.2}%)", summary.total_errors, summary.error_rate),
        ]);
        table.add_row(vec![
            "Requests/sec:",
            &format!("{:.1} avg / {} peak", summary.average_qps, summary.peak_qps),
        ]);

        if let Some(pool) = &summary.pool {
            table.add_row(vec!["", ""]);
            table.add_row(vec![
                "Connections:",
                &format!(
                    "{} dialed, {} dial errors, {} idle",
                    pool.dialed, pool.dial_errors, pool.idle
                ),
            ]);
        }

        table.to_string()
    }

    /// Format results as JSON.
    pub fn format_json(summary: &BenchSummary) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }

    /// Format results as CSV row.
    pub fn format_csv(summary: &BenchSummary) -> String {
        format!(
            "{},{},{},{},{:.1},{},{},{:.1},{},{:.2}",
            summary.timestamp,
            summary.name,
            summary.concurrency,
            summary.seeded,
            summary.duration_secs,
            summary.total_requests,
            summary.total_errors,
            summary.average_qps,
            summary.peak_qps,
            summary.error_rate
        )
    }

    /// CSV header row.
    pub fn csv_header() -> &'static str {
        "timestamp,name,concurrency,seeded,duration,requests,errors,avg_qps,peak_qps,error_rate"
    }
}
