//! Unit tests for sc-core primitives.

#[cfg(test)]
mod ids {
    use crate::{IntersectionId, LaneId, PhaseIndex};

    #[test]
    fn index_roundtrip() {
        let id = LaneId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(LaneId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(LaneId::INVALID.0, u32::MAX);
        assert_eq!(IntersectionId::INVALID.0, u32::MAX);
        assert_eq!(PhaseIndex::INVALID.0, u16::MAX);
    }

    #[test]
    fn next_in_cycle_wraps() {
        assert_eq!(PhaseIndex(0).next_in_cycle(3), PhaseIndex(1));
        assert_eq!(PhaseIndex(2).next_in_cycle(3), PhaseIndex(0));
    }

    #[test]
    fn display() {
        assert_eq!(IntersectionId(7).to_string(), "IntersectionId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimDuration, SimTime, Tick};

    #[test]
    fn from_secs_f64_rounds_to_millis() {
        assert_eq!(SimDuration::from_secs_f64(0.5), Some(SimDuration(500)));
        assert_eq!(SimDuration::from_secs_f64(1.0004), Some(SimDuration(1_000)));
        assert_eq!(SimDuration::from_secs_f64(-1.0), None);
        assert_eq!(SimDuration::from_secs_f64(f64::NAN), None);
    }

    #[test]
    fn since_saturates() {
        assert_eq!(SimTime(5_000).since(SimTime(2_000)), SimDuration(3_000));
        assert_eq!(SimTime(1_000).since(SimTime(2_000)), SimDuration::ZERO);
    }

    #[test]
    fn display_hms() {
        assert_eq!(SimTime::from_secs(3_725).to_string(), "01:02:05.000");
    }

    #[test]
    fn clock_expects_previous_plus_step() {
        let mut clock = SimClock::new(SimTime::ZERO, SimDuration::from_millis(500));
        assert_eq!(clock.expected_next(), SimTime(500));
        clock.advance(SimTime(500));
        assert_eq!(clock.current_tick, Tick(1));
        assert_eq!(clock.expected_next(), SimTime(1_000));
    }
}

#[cfg(test)]
mod config {
    use crate::{ControllerConfig, RunConfig, SimDuration, SimTime};

    #[test]
    fn defaults_validate() {
        ControllerConfig::default().validate().unwrap();
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn step_length_converts() {
        let cfg = ControllerConfig { step_length_secs: 0.25, ..Default::default() };
        assert_eq!(cfg.step_length().unwrap(), SimDuration(250));
    }

    #[test]
    fn zero_step_rejected() {
        let cfg = ControllerConfig { step_length_secs: 0.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sub_millisecond_step_rejected() {
        let cfg = ControllerConfig { step_length_secs: 0.0005, ..Default::default() };
        assert!(cfg.step_length().is_err());
    }

    #[test]
    fn control_period_scales_with_interval() {
        let cfg = ControllerConfig { control_interval_ticks: 5, ..Default::default() };
        assert_eq!(cfg.control_period().unwrap(), SimDuration::from_secs(5));
    }

    #[test]
    fn negative_threshold_rejected() {
        let cfg = ControllerConfig { pressure_threshold: -1.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn run_end_time() {
        let run = RunConfig { end_time_secs: 120.0, ..Default::default() };
        assert_eq!(run.end_time().unwrap(), SimTime::from_secs(120));
    }

    #[test]
    fn zero_flush_interval_rejected() {
        let run = RunConfig { flush_interval_ticks: 0, ..Default::default() };
        assert!(run.validate().is_err());
    }
}

#[cfg(test)]
mod lane {
    use crate::{LaneId, LaneRng, LaneState};

    #[test]
    fn free_fraction_clamps() {
        let s = LaneState { lane: LaneId(0), queue_length: 0, occupancy: 1.4, mean_speed: 0.0 };
        assert_eq!(s.free_fraction(), 0.0);
        let s = LaneState { occupancy: 0.25, ..s };
        assert_eq!(s.free_fraction(), 0.75);
    }

    #[test]
    fn lane_rng_is_deterministic() {
        let mut a = LaneRng::new(7, LaneId(3));
        let mut b = LaneRng::new(7, LaneId(3));
        let xs: Vec<bool> = (0..32).map(|_| a.gen_bool(0.5)).collect();
        let ys: Vec<bool> = (0..32).map(|_| b.gen_bool(0.5)).collect();
        assert_eq!(xs, ys);
    }
}
