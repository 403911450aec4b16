//! The clock adapter: the controller's only path to the simulator.
//!
//! The backend lives on a dedicated worker thread.  Every call sends one
//! request over a crossbeam channel and waits at most `timeout` for the
//! reply, so a hung simulator surfaces as [`AdapterError::SimulatorUnavailable`]
//! instead of blocking the control loop forever.
//!
//! Once a connectivity failure has been observed the adapter is *poisoned*:
//! every later call fails with the same reason and the worker is detached
//! rather than joined on close.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use sc_core::{IntersectionId, LaneId, LaneState, PhaseIndex, SimClock, SimDuration, SimTime, Tick};

use crate::{AdapterError, AdapterResult, Simulator, SimulatorFault};

// ── Wire protocol between adapter and worker ──────────────────────────────────

enum Request {
    Now,
    Step(SimDuration),
    Lane(LaneId),
    SetPhase(IntersectionId, PhaseIndex),
    Close,
}

enum Reply {
    Time(Result<SimTime, SimulatorFault>),
    Lane(Result<Option<LaneState>, SimulatorFault>),
    Unit(Result<(), SimulatorFault>),
}

fn serve<S: Simulator>(mut sim: S, requests: Receiver<Request>, replies: Sender<Reply>) {
    // A closed request channel means the adapter was dropped without `close`.
    while let Ok(request) = requests.recv() {
        let reply = match request {
            Request::Now => Reply::Time(sim.now()),
            Request::Step(d) => Reply::Time(sim.step(d)),
            Request::Lane(lane) => Reply::Lane(sim.lane_state(lane)),
            Request::SetPhase(j, p) => Reply::Unit(sim.set_phase(j, p)),
            Request::Close => break,
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
    sim.close();
}

// ── ClockAdapter ──────────────────────────────────────────────────────────────

/// Step-synchronous handle on a [`Simulator`].
///
/// Owns the connection for its whole lifetime; [`close`][Self::close] (or
/// `Drop`) shuts the worker down on every exit path.
pub struct ClockAdapter {
    requests: Sender<Request>,
    replies:  Receiver<Reply>,
    worker:   Option<JoinHandle<()>>,
    clock:    SimClock,
    timeout:  Duration,
    poisoned: Option<String>,
}

impl ClockAdapter {
    /// Move `sim` onto a worker thread and read its starting time.
    pub fn connect<S: Simulator>(sim: S, step: SimDuration, timeout: Duration) -> AdapterResult<Self> {
        let (req_tx, req_rx) = crossbeam_channel::unbounded();
        // One request is ever in flight, so one slot suffices.
        let (rep_tx, rep_rx) = crossbeam_channel::bounded(1);

        let worker = thread::Builder::new()
            .name("simulator-link".into())
            .spawn(move || serve(sim, req_rx, rep_tx))
            .map_err(|e| AdapterError::SimulatorUnavailable {
                reason: format!("failed to spawn simulator worker: {e}"),
            })?;

        let mut adapter = Self {
            requests: req_tx,
            replies:  rep_rx,
            worker:   Some(worker),
            clock:    SimClock::new(SimTime::ZERO, step),
            timeout,
            poisoned: None,
        };

        let start = match adapter.call(Request::Now)? {
            Reply::Time(r) => r.map_err(|f| adapter.fault(f))?,
            _ => return Err(adapter.unexpected_reply()),
        };
        adapter.clock = SimClock::new(start, step);
        debug!("connected to simulator at {start}, step {step}");
        Ok(adapter)
    }

    /// Last simulated time confirmed by the simulator.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock.current_time
    }

    /// Steps completed since connecting.
    #[inline]
    pub fn tick(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn step(&self) -> SimDuration {
        self.clock.step
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Advance the simulator by one step and confirm the new time.
    ///
    /// The simulator must report exactly `now() + step()`; anything else is a
    /// [`AdapterError::SimulatorDesync`] and poisons the adapter.
    pub fn advance(&mut self) -> AdapterResult<SimTime> {
        let expected = self.clock.expected_next();
        let got = match self.call(Request::Step(self.clock.step))? {
            Reply::Time(r) => r.map_err(|f| self.fault(f))?,
            _ => return Err(self.unexpected_reply()),
        };
        if got != expected {
            self.poison(format!("simulator reported {got}, expected {expected}"));
            return Err(AdapterError::SimulatorDesync { expected, got });
        }
        self.clock.advance(got);
        Ok(got)
    }

    /// Read one lane.  `Ok(None)` means the lane produced no telemetry this
    /// step.
    pub fn query_lane(&mut self, lane: LaneId) -> AdapterResult<Option<LaneState>> {
        match self.call(Request::Lane(lane))? {
            Reply::Lane(r) => r.map_err(|f| self.fault(f)),
            _ => Err(self.unexpected_reply()),
        }
    }

    /// Request `phase` at `intersection`.  Visible from the next
    /// [`advance`][Self::advance] onwards.
    pub fn apply_phase(&mut self, intersection: IntersectionId, phase: PhaseIndex) -> AdapterResult<()> {
        match self.call(Request::SetPhase(intersection, phase))? {
            Reply::Unit(r) => r.map_err(|f| self.fault(f)),
            _ => Err(self.unexpected_reply()),
        }
    }

    /// Shut the connection down.  Equivalent to dropping the adapter.
    pub fn close(mut self) {
        self.shutdown();
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn call(&mut self, request: Request) -> AdapterResult<Reply> {
        if let Some(reason) = &self.poisoned {
            return Err(AdapterError::SimulatorUnavailable { reason: reason.clone() });
        }
        if self.requests.send(request).is_err() {
            return Err(self.poison("simulator worker has exited".into()));
        }
        match self.replies.recv_timeout(self.timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Timeout) => {
                Err(self.poison(format!("no reply within {} ms", self.timeout.as_millis())))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(self.poison("simulator worker has exited".into()))
            }
        }
    }

    /// Translate a backend fault.  Lost connections poison the adapter.
    fn fault(&mut self, fault: SimulatorFault) -> AdapterError {
        match fault {
            SimulatorFault::Disconnected(reason) => self.poison(reason),
            SimulatorFault::UnknownLane(lane) => AdapterError::UnknownLane(lane),
            SimulatorFault::UnknownIntersection(intersection) => AdapterError::InvalidPhaseIndex {
                intersection,
                phase:       PhaseIndex::INVALID,
                phase_count: 0,
            },
            SimulatorFault::PhaseOutOfRange { intersection, phase, phase_count } => {
                AdapterError::InvalidPhaseIndex { intersection, phase, phase_count }
            }
        }
    }

    fn poison(&mut self, reason: String) -> AdapterError {
        warn!("simulator connection lost at {}: {reason}", self.clock);
        self.poisoned = Some(reason.clone());
        AdapterError::SimulatorUnavailable { reason }
    }

    fn unexpected_reply(&mut self) -> AdapterError {
        self.poison("simulator worker sent a mismatched reply".into())
    }

    fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else { return };
        let _ = self.requests.send(Request::Close);
        if self.poisoned.is_some() {
            // The worker may be stuck inside the backend; leave it detached.
            return;
        }
        if worker.join().is_err() {
            warn!("simulator worker panicked during shutdown");
        }
    }
}

impl Drop for ClockAdapter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
