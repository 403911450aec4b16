//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `tick_records.csv`
//! - `phase_switches.csv`
//! - `warnings.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::TelemetryWriter;
use crate::{LanePressureRow, OutputResult, SwitchRow, WarningRow};

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes controller telemetry to three CSV files.
pub struct CsvWriter {
    records:  Writer<File>,
    switches: Writer<File>,
    warnings: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three files, and write header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut records = Writer::from_path(dir.join("tick_records.csv"))?;
        records.write_record([
            "tick", "sim_time_secs", "intersection", "active_phase", "clearing", "degraded", "lane",
            "pressure",
        ])?;

        let mut switches = Writer::from_path(dir.join("phase_switches.csv"))?;
        switches.write_record([
            "sim_time_secs", "intersection", "from_phase", "to_phase", "elapsed_green_secs", "reason",
        ])?;

        let mut warnings = Writer::from_path(dir.join("warnings.csv"))?;
        warnings.write_record(["sim_time_secs", "intersection", "consecutive_ticks", "missing_lanes"])?;

        Ok(Self { records, switches, warnings, finished: false })
    }
}

impl TelemetryWriter for CsvWriter {
    fn write_records(&mut self, rows: &[LanePressureRow]) -> OutputResult<()> {
        for row in rows {
            self.records.write_record(&[
                row.tick.to_string(),
                row.sim_time_secs.to_string(),
                row.intersection.to_string(),
                row.active_phase.to_string(),
                (row.clearing as u8).to_string(),
                (row.degraded as u8).to_string(),
                opt(row.lane),
                opt(row.pressure),
            ])?;
        }
        Ok(())
    }

    fn write_switch(&mut self, row: &SwitchRow) -> OutputResult<()> {
        self.switches.write_record(&[
            row.sim_time_secs.to_string(),
            row.intersection.to_string(),
            row.from_phase.to_string(),
            row.to_phase.to_string(),
            row.elapsed_green_secs.to_string(),
            row.reason.to_string(),
        ])?;
        Ok(())
    }

    fn write_warning(&mut self, row: &WarningRow) -> OutputResult<()> {
        self.warnings.write_record(&[
            row.sim_time_secs.to_string(),
            row.intersection.to_string(),
            row.consecutive_ticks.to_string(),
            row.missing_lanes.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.records.flush()?;
        self.switches.flush()?;
        self.warnings.flush()?;
        Ok(())
    }
}
