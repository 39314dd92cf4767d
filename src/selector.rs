use crate::config::SelectorConfig;
use crate::history::HistoryQueue;
use crate::state::{Correction, CorrectionSource, CycleInputs, RangeSample};

/// Range sensor capability fitted to the airframe. The selector only depends
/// on this, never on a compiled-in sensor model.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RangeSensorKind {
    Tof,
    Sonar,
    None,
}

/// Decides, per cycle, whether to trust the range sensor or the barometer,
/// and turns the chosen reading into a position-error signal plus the time
/// constant the estimator blends it with.
pub struct CorrectionSelector {
    config: SelectorConfig,
}

impl CorrectionSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// `published_alt_cm` is the pre-update published altitude,
    /// `current_base_cm` the integrator's base position this cycle (fallback
    /// when the history queue cannot answer the delayed lookup yet).
    /// Returns `None` when neither sensor has fresh data.
    pub fn select(
        &self,
        inputs: &CycleInputs,
        published_alt_cm: f32,
        current_base_cm: f32,
        history: &HistoryQueue,
        now_us: u32,
    ) -> Option<Correction> {
        let tilt_ok = inputs.tilt_deg < self.config.tilt_max_deg;

        // Range sensor wins when trustworthy: low latency, high confidence
        // inside its envelope.
        if self.range_usable(&inputs.range, tilt_ok) {
            return Some(Correction {
                position_error_cm: inputs.range.height_cm - published_alt_cm,
                time_constant_s: self.config.tof_time_constant_s,
                source: CorrectionSource::Tof,
            });
        }

        if inputs.baro.fresh {
            // Align the delayed baro reading against the base position the
            // vehicle had when the sample was physically taken.
            let delayed_base = history
                .value_at(now_us.wrapping_sub(self.config.baro_latency_us))
                .unwrap_or(current_base_cm);
            // Steeper tilt corrupts the pressure reading; damp harder.
            let time_constant_s = if tilt_ok {
                self.config.baro_time_constant_s
            } else {
                self.config.baro_tilted_time_constant_s
            };
            return Some(Correction {
                position_error_cm: inputs.baro.height_cm - delayed_base,
                time_constant_s,
                source: CorrectionSource::Baro,
            });
        }

        None
    }

    fn range_usable(&self, range: &RangeSample, tilt_ok: bool) -> bool {
        self.config.range_sensor != RangeSensorKind::None
            && range.fresh
            && range.height_cm >= self.config.min_range_cm
            && range.height_cm <= self.config.max_range_cm
            && tilt_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BaroSample;

    fn selector() -> CorrectionSelector {
        CorrectionSelector::new(SelectorConfig::default())
    }

    fn inputs(tof_cm: f32, tof_fresh: bool, baro_cm: f32, baro_fresh: bool, tilt: f32) -> CycleInputs {
        CycleInputs {
            accel_z_cm_s2: 0.0,
            range: RangeSample {
                height_cm: tof_cm,
                timestamp_us: 0,
                fresh: tof_fresh,
            },
            baro: BaroSample {
                height_cm: baro_cm,
                timestamp_us: 0,
                fresh: baro_fresh,
            },
            tilt_deg: tilt,
        }
    }

    #[test]
    fn test_tof_preferred_when_valid() {
        let sel = selector();
        let hist = HistoryQueue::new();
        let c = sel
            .select(&inputs(150.0, true, 170.0, true, 5.0), 140.0, 0.0, &hist, 1_000_000)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Tof);
        assert!((c.position_error_cm - 10.0).abs() < 1e-6);
        assert!((c.time_constant_s - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_tof_out_of_range_falls_back_to_baro() {
        let sel = selector();
        let hist = HistoryQueue::new();
        // 400 cm is above the 350 cm ceiling, even though the sample is fresh
        let c = sel
            .select(&inputs(400.0, true, 170.0, true, 5.0), 140.0, 0.0, &hist, 1_000_000)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Baro);
    }

    #[test]
    fn test_tof_below_min_range_falls_back_to_baro() {
        let sel = selector();
        let hist = HistoryQueue::new();
        let c = sel
            .select(&inputs(5.0, true, 40.0, true, 5.0), 10.0, 0.0, &hist, 1_000_000)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Baro);
    }

    #[test]
    fn test_tilt_forces_baro_and_damps_harder() {
        let sel = selector();
        let hist = HistoryQueue::new();
        // 30° tilt: range sensor rejected and baro trust reduced
        let c = sel
            .select(&inputs(150.0, true, 170.0, true, 30.0), 140.0, 0.0, &hist, 1_000_000)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Baro);
        assert!((c.time_constant_s - 5.0).abs() < 1e-6);

        // 10° tilt with stale ToF: baro branch at normal trust
        let c = sel
            .select(&inputs(150.0, false, 170.0, true, 10.0), 140.0, 0.0, &hist, 1_000_000)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Baro);
        assert!((c.time_constant_s - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_baro_error_uses_delayed_base() {
        let sel = selector();
        let mut hist = HistoryQueue::new();
        // Vehicle climbed 2 cm per 20 ms cycle
        for i in 0..50u32 {
            hist.push(i * 20_000, i as f32 * 2.0);
        }
        let now = 49 * 20_000;
        // Baro latency 250 ms → 12.5 cycles back → sample 36 at 72 cm
        let c = sel
            .select(&inputs(0.0, false, 80.0, true, 0.0), 95.0, 98.0, &hist, now)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Baro);
        assert!((c.position_error_cm - (80.0 - 72.0)).abs() < 1e-6);
    }

    #[test]
    fn test_baro_falls_back_to_current_base_without_history() {
        let sel = selector();
        let hist = HistoryQueue::new();
        let c = sel
            .select(&inputs(0.0, false, 80.0, true, 0.0), 95.0, 70.0, &hist, 1_000_000)
            .unwrap();
        assert!((c.position_error_cm - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_fresh_data_yields_no_correction() {
        let sel = selector();
        let hist = HistoryQueue::new();
        assert!(sel
            .select(&inputs(150.0, false, 170.0, false, 5.0), 140.0, 0.0, &hist, 1_000_000)
            .is_none());
    }

    #[test]
    fn test_no_range_sensor_fitted_ignores_range_samples() {
        let config = SelectorConfig {
            range_sensor: RangeSensorKind::None,
            ..SelectorConfig::default()
        };
        let sel = CorrectionSelector::new(config);
        let hist = HistoryQueue::new();
        let c = sel
            .select(&inputs(150.0, true, 170.0, true, 5.0), 140.0, 0.0, &hist, 1_000_000)
            .unwrap();
        assert_eq!(c.source, CorrectionSource::Baro);
    }
}
