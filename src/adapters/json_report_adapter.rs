//! JSON report renderer.

use crate::domain::error::TradesimError;
use crate::ports::report_port::{BacktestReport, ReportPort};

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn render(&self, report: &BacktestReport<'_>) -> Result<String, TradesimError> {
        serde_json::to_string_pretty(report).map_err(|e| TradesimError::Data {
            reason: format!("failed to render report: {}", e),
        })
    }
}
