//! `MetricsObserver<W>`: bridges `RunObserver` to a `TelemetryWriter`.

use sc_control::{SwitchEvent, TelemetryGapWarning};
use sc_sim::{RunObserver, RunSummary, TickRecord};

use crate::row::{LanePressureRow, SwitchRow, WarningRow};
use crate::writer::TelemetryWriter;
use crate::{OutputError, OutputResult};

/// A [`RunObserver`] that writes on the control thread.
///
/// Errors from the writer are stored because observer hooks have no return
/// value.  After `run()` returns, call [`finish`][Self::finish] (which also
/// covers aborted runs, where `on_run_end` never fires) or
/// [`take_error`][Self::take_error].
pub struct MetricsObserver<W: TelemetryWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: TelemetryWriter> MetricsObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any).
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Close the writer and report the first error seen during the run.
    pub fn finish(&mut self) -> OutputResult<()> {
        let closed = self.writer.finish();
        match self.last_error.take() {
            Some(e) => Err(e),
            None => closed,
        }
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: TelemetryWriter> RunObserver for MetricsObserver<W> {
    fn on_switch(&mut self, event: &SwitchEvent) {
        let result = self.writer.write_switch(&SwitchRow::from(event));
        self.store_err(result);
    }

    fn on_warning(&mut self, warning: &TelemetryGapWarning) {
        let result = self.writer.write_warning(&WarningRow::from(warning));
        self.store_err(result);
    }

    fn on_flush(&mut self, records: Vec<TickRecord>) {
        let rows = LanePressureRow::from_records(&records);
        if !rows.is_empty() {
            let result = self.writer.write_records(&rows);
            self.store_err(result);
        }
    }

    fn on_run_end(&mut self, _summary: &RunSummary) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
