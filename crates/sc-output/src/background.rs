//! `BackgroundObserver`: moves telemetry writing off the control thread.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use sc_control::{SwitchEvent, TelemetryGapWarning};
use sc_sim::{RunObserver, RunSummary, TickRecord};

use crate::row::{LanePressureRow, SwitchRow, WarningRow};
use crate::writer::TelemetryWriter;
use crate::{OutputError, OutputResult};

enum Batch {
    Records(Vec<TickRecord>),
    Switch(SwitchEvent),
    Warning(TelemetryGapWarning),
}

/// Writer loop.  Keeps draining after a failure so the sender never
/// blocks, and returns the first error.
fn drain<W: TelemetryWriter>(mut writer: W, batches: Receiver<Batch>) -> OutputResult<()> {
    let mut first_error: Option<OutputError> = None;
    for batch in batches {
        if first_error.is_some() {
            continue;
        }
        let result = match batch {
            Batch::Records(records) => writer.write_records(&LanePressureRow::from_records(&records)),
            Batch::Switch(e) => writer.write_switch(&SwitchRow::from(&e)),
            Batch::Warning(w) => writer.write_warning(&WarningRow::from(&w)),
        };
        if let Err(e) = result {
            warn!("telemetry writer failed, discarding further output: {e}");
            first_error = Some(e);
        }
    }
    let closed = writer.finish();
    match first_error {
        Some(e) => Err(e),
        None => closed,
    }
}

/// A [`RunObserver`] that hands every batch to a dedicated writer thread
/// over an unbounded channel.  The control loop never waits on the writer.
///
/// The writer thread is joined by [`finish`][Self::finish], by `on_run_end`,
/// or on drop, whichever comes first.
pub struct BackgroundObserver {
    batches:    Option<Sender<Batch>>,
    worker:     Option<JoinHandle<OutputResult<()>>>,
    last_error: Option<OutputError>,
}

impl BackgroundObserver {
    pub fn spawn<W: TelemetryWriter + Send + 'static>(writer: W) -> OutputResult<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = thread::Builder::new()
            .name("telemetry-writer".into())
            .spawn(move || drain(writer, rx))?;
        Ok(Self { batches: Some(tx), worker: Some(worker), last_error: None })
    }

    /// Close the channel, wait for the writer to drain, and report the first
    /// error.  Idempotent.
    pub fn finish(&mut self) -> OutputResult<()> {
        self.join();
        match self.last_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Take the stored write error (if any) once the writer has been joined.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    fn send(&mut self, batch: Batch) {
        let Some(tx) = &self.batches else { return };
        if tx.send(batch).is_err() {
            // The writer thread is gone; join it to learn why.
            self.join();
        }
    }

    fn join(&mut self) {
        self.batches = None;
        let Some(worker) = self.worker.take() else { return };
        let result = worker.join().unwrap_or(Err(OutputError::WriterPanicked));
        if let Err(e) = result {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
        debug!("telemetry writer joined");
    }
}

impl RunObserver for BackgroundObserver {
    fn on_switch(&mut self, event: &SwitchEvent) {
        self.send(Batch::Switch(*event));
    }

    fn on_warning(&mut self, warning: &TelemetryGapWarning) {
        self.send(Batch::Warning(warning.clone()));
    }

    fn on_flush(&mut self, records: Vec<TickRecord>) {
        self.send(Batch::Records(records));
    }

    fn on_run_end(&mut self, _summary: &RunSummary) {
        self.join();
    }
}

impl Drop for BackgroundObserver {
    fn drop(&mut self) {
        self.join();
    }
}
