//! The `TelemetryWriter` trait implemented by output backends.

use crate::{LanePressureRow, OutputResult, SwitchRow, WarningRow};

/// A sink for controller telemetry.
///
/// Observers store errors rather than propagate them, since observer hooks
/// have no return value; see [`MetricsObserver::take_error`][crate::MetricsObserver::take_error].
pub trait TelemetryWriter {
    fn write_records(&mut self, rows: &[LanePressureRow]) -> OutputResult<()>;

    fn write_switch(&mut self, row: &SwitchRow) -> OutputResult<()>;

    fn write_warning(&mut self, row: &WarningRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
