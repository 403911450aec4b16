//! `sc-output`: telemetry writers for the corridor signal controller.
//!
//! | File                 | One row per                                   |
//! |----------------------|-----------------------------------------------|
//! | `tick_records.csv`   | lane per intersection per evaluation tick     |
//! | `phase_switches.csv` | committed phase switch                        |
//! | `warnings.csv`       | `TelemetryGapWarning`                         |
//!
//! Writers implement [`TelemetryWriter`] and are driven by one of two
//! `sc_sim::RunObserver`s:
//!
//! - [`MetricsObserver`] writes on the control thread.
//! - [`BackgroundObserver`] hands every batch to a writer thread, so the
//!   control loop never waits on disk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sc_output::{BackgroundObserver, CsvWriter};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = BackgroundObserver::spawn(writer)?;
//! let summary = control.run(simulator, &mut obs);
//! obs.finish()?;
//! ```

pub mod background;
pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use background::BackgroundObserver;
pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::MetricsObserver;
pub use row::{LanePressureRow, SwitchRow, WarningRow};
pub use writer::TelemetryWriter;
