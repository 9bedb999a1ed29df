//! CSV report adapter implementing ReportPort.
//!
//! One row per bar: the inputs, every intermediate stage and the equity curve.
//! The summary metrics go to a sibling `<stem>_summary.csv` as `metric,value` rows.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EmatrailError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;
use tracing::info;

pub const HEADER: [&str; 16] = [
    "date",
    "close",
    "ema_fast",
    "ema_slow",
    "ema_filter",
    "signal",
    "intended",
    "trend_ok",
    "gated",
    "trail_peak",
    "stopped",
    "position",
    "returns",
    "strategy_returns",
    "equity_curve",
    "equity_value",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn to_writer<W: std::io::Write>(
        result: &BacktestResult,
        writer: W,
    ) -> Result<(), EmatrailError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER).map_err(csv_error)?;

        for row in &result.rows {
            wtr.write_record([
                row.date.format("%Y-%m-%d").to_string(),
                row.close.to_string(),
                row.ema_fast.to_string(),
                row.ema_slow.to_string(),
                row.ema_filter.to_string(),
                row.raw_signal.as_u8().to_string(),
                row.intended.as_u8().to_string(),
                row.trend_ok.to_string(),
                row.gated.as_u8().to_string(),
                row.trail_peak.map(|p| p.to_string()).unwrap_or_default(),
                row.stopped.to_string(),
                row.position.as_u8().to_string(),
                row.bar_return.to_string(),
                row.strategy_return.to_string(),
                row.equity_multiplier.to_string(),
                row.equity_value.to_string(),
            ])
            .map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn summary_to_writer<W: std::io::Write>(
        result: &BacktestResult,
        metrics: &Metrics,
        writer: W,
    ) -> Result<(), EmatrailError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["metric", "value"]).map_err(csv_error)?;

        let dates = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let fields = [
            ("symbol", result.symbol.clone()),
            ("strategy", result.config.label()),
            ("start_date", dates(result.start_date())),
            ("end_date", dates(result.end_date())),
            ("initial_capital", result.config.initial_capital.to_string()),
            ("final_value", metrics.final_value.to_string()),
            ("total_return", metrics.total_return.to_string()),
            ("annualized_return", metrics.annualized_return.to_string()),
            ("max_drawdown", metrics.max_drawdown.to_string()),
            ("max_drawdown_duration", metrics.max_drawdown_duration.to_string()),
            ("exposure", metrics.exposure.to_string()),
            ("total_trades", metrics.total_trades.to_string()),
            ("stop_exits", metrics.stop_exits.to_string()),
            ("win_rate", metrics.win_rate.to_string()),
        ];
        for (name, value) in fields {
            wtr.write_record([name, value.as_str()]).map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// `out/report.csv` -> `out/report_summary.csv`
pub fn summary_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    output_path.with_file_name(format!("{stem}_summary.csv"))
}

fn csv_error(e: csv::Error) -> EmatrailError {
    EmatrailError::Io(std::io::Error::other(e))
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_path: &str,
    ) -> Result<(), EmatrailError> {
        let file = File::create(output_path)?;
        Self::to_writer(result, file)?;

        let summary = summary_path(Path::new(output_path));
        Self::summary_to_writer(result, metrics, File::create(&summary)?)?;

        info!(
            path = output_path,
            summary = %summary.display(),
            rows = result.rows.len(),
            "report written"
        );
        Ok(())
    }
}
