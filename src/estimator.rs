use crate::config::EstimatorConfig;
use crate::filter::{BiquadFilter, KalmanSmoother};
use crate::history::HistoryQueue;
use crate::state::Correction;

// ── Constants ────────────────────────────────────────────────────────────────

/// Completed cycles after reset before the derived velocity is trustworthy.
/// Sensor and integration transients dominate the first few cycles.
const WARMUP_CYCLES: u32 = 5;
/// Accel LPF Q (Butterworth)
const ACCEL_LPF_Q: f32 = 0.707;

// ── State ────────────────────────────────────────────────────────────────────

/// Vertical state, mutated once per accepted cycle. `est_alt`/`est_vel` are
/// the only fields published outside the estimator.
#[derive(Clone, Copy, Default)]
struct VerticalState {
    /// Integrated from acceleration (cm).
    position_base: f32,
    /// Slow-moving correction driven by sensor error (cm).
    position_correction: f32,
    /// Instantaneous error signal from the active sensor branch (cm).
    position_error_z: f32,
    /// Rate of change of the fused position (cm/s).
    velocity_z: f32,
    /// Published, smoothed outputs.
    est_alt: f32,
    est_vel: f32,
}

/// Integrates vertical acceleration into a base position, blends in the
/// selected sensor correction through a first-order low-pass, and smooths
/// both outputs. One instance per vehicle; owns its history queue.
pub struct VerticalEstimator {
    config: EstimatorConfig,
    state: VerticalState,
    /// Integrated-accel velocity, drives base propagation only.
    velocity_base: f32,
    fused_prev: f32,
    alt_smoother: KalmanSmoother,
    vel_smoother: KalmanSmoother,
    accel_lpf: BiquadFilter,
    history: HistoryQueue,
    /// Smoothed accel from the current cycle, for the controller's damping
    /// term.
    accel_now: f32,
    last_update_us: Option<u32>,
    last_dt_s: f32,
    cycles_since_reset: u32,
}

impl VerticalEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        let initial = config.initial_altitude_cm;
        Self {
            config,
            state: VerticalState {
                position_base: initial,
                est_alt: initial,
                ..VerticalState::default()
            },
            velocity_base: 0.0,
            fused_prev: initial,
            alt_smoother: KalmanSmoother::new(config.alt_q, config.alt_r, initial),
            vel_smoother: KalmanSmoother::new(config.vel_q, config.vel_r, 0.0),
            accel_lpf: BiquadFilter::new_lpf(
                config.accel_lpf_cutoff_hz,
                config.nominal_rate_hz,
                ACCEL_LPF_Q,
            ),
            history: HistoryQueue::new(),
            accel_now: 0.0,
            last_update_us: None,
            last_dt_s: 1.0 / config.nominal_rate_hz,
            cycles_since_reset: 0,
        }
    }

    /// Advance one cycle. `accel_z_cm_s2` is earth-frame vertical accel with
    /// gravity removed; `correction` comes from the selector, `None` when no
    /// sensor had fresh data (the correction term is then frozen and pure
    /// inertial integration carries the estimate).
    ///
    /// Returns `false` when the time guard skipped the cycle; published
    /// values are retained in that case.
    pub fn update(&mut self, now_us: u32, accel_z_cm_s2: f32, correction: Option<Correction>) -> bool {
        let dt = match self.elapsed(now_us) {
            Some(dt) => dt,
            None => return false,
        };
        self.last_dt_s = dt;

        let accel = self.accel_lpf.filter(accel_z_cm_s2);
        self.accel_now = accel;

        // accel → velocity → position
        self.state.position_base += self.velocity_base * dt + 0.5 * accel * dt * dt;
        self.velocity_base += accel * dt;

        // Complementary blend of the sensor error into the position
        if let Some(c) = correction {
            self.state.position_error_z = c.position_error_cm;
            self.state.position_correction +=
                (c.position_error_cm - self.state.position_correction) * dt / c.time_constant_s;
        } else {
            self.state.position_error_z = 0.0;
        }

        self.history.push(now_us, self.state.position_base);

        let fused = self.state.position_base + self.state.position_correction;
        self.state.est_alt = self.alt_smoother.update(fused);

        self.state.velocity_z = (fused - self.fused_prev) / dt;
        self.fused_prev = fused;
        self.state.est_vel = self.vel_smoother.update(self.state.velocity_z);

        self.cycles_since_reset = self.cycles_since_reset.saturating_add(1);
        true
    }

    /// dt since the previous accepted timestamp, or `None` when this cycle
    /// must be skipped. The stored timestamp is always resynced so one bad
    /// tick cannot poison every cycle after it.
    fn elapsed(&mut self, now_us: u32) -> Option<f32> {
        let last = match self.last_update_us.replace(now_us) {
            Some(t) => t,
            // First cycle after reset has no previous timestamp
            None => return Some(1.0 / self.config.nominal_rate_hz),
        };
        let delta_us = now_us.wrapping_sub(last) as i32;
        if delta_us <= 0 {
            return None; // non-monotonic time
        }
        let dt = delta_us as f32 / 1_000_000.0;
        if dt > self.config.stalled_dt_s {
            return None; // scheduler stall, don't integrate across the gap
        }
        Some(dt.min(self.config.max_dt_s))
    }

    pub fn reset(&mut self) {
        let initial = self.config.initial_altitude_cm;
        self.state = VerticalState {
            position_base: initial,
            est_alt: initial,
            ..VerticalState::default()
        };
        self.velocity_base = 0.0;
        self.fused_prev = initial;
        self.alt_smoother.reset();
        self.vel_smoother.reset();
        self.accel_lpf.reset();
        self.history.clear();
        self.accel_now = 0.0;
        self.last_update_us = None;
        self.last_dt_s = 1.0 / self.config.nominal_rate_hz;
        self.cycles_since_reset = 0;
    }

    // ── Published outputs ────────────────────────────────────────────────────

    pub fn altitude_cm(&self) -> f32 {
        self.state.est_alt
    }

    pub fn velocity_cm_s(&self) -> f32 {
        self.state.est_vel
    }

    /// False during warm-up; callers must not close a control loop on the
    /// velocity until this is true.
    pub fn velocity_valid(&self) -> bool {
        self.cycles_since_reset >= WARMUP_CYCLES
    }

    pub fn position_base_cm(&self) -> f32 {
        self.state.position_base
    }

    pub fn position_error_cm(&self) -> f32 {
        self.state.position_error_z
    }

    pub fn history(&self) -> &HistoryQueue {
        &self.history
    }

    pub fn accel_now_cm_s2(&self) -> f32 {
        self.accel_now
    }

    pub fn last_dt_s(&self) -> f32 {
        self.last_dt_s
    }
}
