//! CSV export for comparison reports (spec.md §6): one row per
//! (algorithm, scenario, run), columns fixed by the spec's schema.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::result::SchedulingResult;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct CsvRow {
    pub algorithm: String,
    pub scenario: String,
    #[serde(rename = "taskCount")]
    pub task_count: usize,
    #[serde(rename = "nodeCount")]
    pub node_count: usize,
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    pub makespan: f64,
    #[serde(rename = "deadlineHitRate")]
    pub deadline_hit_rate: f64,
    #[serde(rename = "executionTimeMs")]
    pub execution_time_ms: f64,
    #[serde(rename = "energyConsumption")]
    pub energy_consumption: f64,
    #[serde(rename = "fogUtilization")]
    pub fog_utilization: f64,
    #[serde(rename = "cloudUtilization")]
    pub cloud_utilization: f64,
    /// ISO-8601 UTC.
    pub timestamp: String,
}

impl CsvRow {
    pub fn from_result(
        algorithm: &str,
        scenario: &str,
        task_count: usize,
        node_count: usize,
        result: &SchedulingResult,
        execution_time_ms: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        CsvRow {
            algorithm: algorithm.to_string(),
            scenario: scenario.to_string(),
            task_count,
            node_count,
            total_cost: result.total_cost,
            makespan: result.makespan,
            deadline_hit_rate: result.deadline_hit_rate,
            execution_time_ms,
            energy_consumption: result.total_energy,
            fog_utilization: result.fog_utilization,
            cloud_utilization: result.cloud_utilization,
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

/// Writes every row to `path` as a single CSV file with a header row.
pub fn write_csv(path: &Path, rows: &[CsvRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Same as [`write_csv`] but appends to any writer, for tests that want
/// to inspect the bytes without touching the filesystem.
pub fn write_csv_to(writer: impl Write, rows: &[CsvRow]) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    for row in rows {
        w.serialize(row)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::result::SchedulingResult;
    use std::collections::HashMap;

    fn sample_result() -> SchedulingResult {
        SchedulingResult {
            assignment: HashMap::new(),
            start_time: HashMap::new(),
            total_cost: 1.23,
            makespan: 4.5,
            deadline_hit_rate: 1.0,
            total_energy: 0.5,
            avg_latency: 2.0,
            fog_utilization: 0.8,
            cloud_utilization: 0.1,
            sentinel_hits: 0,
            operator_faults: 0,
        }
    }

    #[test]
    fn writes_header_and_one_row() {
        let result = sample_result();
        let timestamp: DateTime<Utc> = "2024-01-01T00:00:00Z".parse().unwrap();
        let row = CsvRow::from_result("EnhancedEpoCeis", "S1", 3, 2, &result, 12.5, timestamp);

        let mut buf = Vec::new();
        write_csv_to(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("algorithm,scenario,taskCount"));
        assert!(text.contains("EnhancedEpoCeis,S1,3,2"));
    }
}
