//! Facade owning one estimator, selector and controller instance. The
//! surrounding control loop calls [`AltitudeHold::update`] once per cycle
//! with a sensor snapshot, then [`AltitudeHold::compute_throttle_adjustment`]
//! and [`AltitudeHold::apply_hold`] to correct the pilot throttle.

use crate::config::Config;
use crate::controller::{AltHoldController, HoldMode};
use crate::estimator::VerticalEstimator;
use crate::selector::CorrectionSelector;
use crate::state::{CorrectionSource, CycleInputs, TelemetrySnapshot};

pub struct AltitudeHold {
    estimator: VerticalEstimator,
    selector: CorrectionSelector,
    controller: AltHoldController,
    telemetry: TelemetrySnapshot,
}

impl AltitudeHold {
    pub fn new(config: Config) -> Self {
        Self {
            estimator: VerticalEstimator::new(config.estimator),
            selector: CorrectionSelector::new(config.selector),
            controller: AltHoldController::new(config.hold),
            telemetry: TelemetrySnapshot::default(),
        }
    }

    /// Advance the estimator one control cycle. Degraded inputs never fail:
    /// stale sensors skip their branch, bad timestamps skip the whole cycle
    /// with previous outputs retained.
    pub fn update(&mut self, now_us: u32, inputs: &CycleInputs) {
        let correction = self.selector.select(
            inputs,
            self.estimator.altitude_cm(),
            self.estimator.position_base_cm(),
            self.estimator.history(),
            now_us,
        );

        let advanced = self
            .estimator
            .update(now_us, inputs.accel_z_cm_s2, correction);
        if !advanced {
            return;
        }

        let (error, tau, source) = match correction {
            Some(c) => (c.position_error_cm, c.time_constant_s, c.source),
            None => (0.0, 0.0, CorrectionSource::None),
        };
        self.telemetry.est_alt_cm = self.estimator.altitude_cm();
        self.telemetry.est_vel_cm_s = self.estimator.velocity_cm_s();
        self.telemetry.position_error_cm = error;
        self.telemetry.time_constant_s = tau;
        self.telemetry.source = source;
        self.telemetry.velocity_valid = self.estimator.velocity_valid();
        self.telemetry.cycles_since_correction = match source {
            CorrectionSource::None => self.telemetry.cycles_since_correction.saturating_add(1),
            _ => 0,
        };
    }

    /// Run the hold controller on the current estimate. Call once per cycle,
    /// after [`update`](Self::update). During warm-up the velocity estimate
    /// is transient-laden; gate mode entry on [`velocity_valid`](Self::velocity_valid).
    pub fn compute_throttle_adjustment(&mut self) -> i32 {
        let delta = self.controller.update(
            self.estimator.last_dt_s(),
            self.estimator.altitude_cm(),
            self.estimator.velocity_cm_s(),
            self.estimator.accel_now_cm_s2(),
        );
        let terms = self.controller.pid_terms();
        self.telemetry.set_velocity_cm_s = terms.set_velocity;
        self.telemetry.velocity_error_cm_s = terms.velocity_error;
        self.telemetry.pid_p = terms.p;
        self.telemetry.pid_i = terms.i;
        self.telemetry.pid_d = terms.d;
        self.telemetry.throttle_delta = delta;
        delta
    }

    /// Mix the last computed delta into a throttle command, per vehicle type.
    pub fn apply_hold(&self, throttle_cmd: i32) -> i32 {
        self.controller
            .apply_hold(throttle_cmd, self.telemetry.throttle_delta)
    }

    /// Zero all estimator, filter and PID state. Safe at any cycle boundary,
    /// idempotent; the next `update` starts a fresh warm-up.
    pub fn reset(&mut self) {
        #[cfg(feature = "defmt")]
        defmt::debug!("altitude hold reset");
        self.estimator.reset();
        self.controller.reset();
        self.telemetry = TelemetrySnapshot::default();
    }

    // ── Published outputs ────────────────────────────────────────────────────

    pub fn estimated_altitude_cm(&self) -> i32 {
        self.estimator.altitude_cm() as i32
    }

    pub fn estimated_velocity_cm_s(&self) -> i32 {
        self.estimator.velocity_cm_s() as i32
    }

    /// False until enough cycles have run since reset for the velocity
    /// estimate to be trustworthy.
    pub fn velocity_valid(&self) -> bool {
        self.estimator.velocity_valid()
    }

    /// Read-only intermediate signals for telemetry. Never an input.
    pub fn telemetry(&self) -> &TelemetrySnapshot {
        &self.telemetry
    }

    // ── Mode / setpoints ─────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: HoldMode) {
        self.controller.set_mode(mode);
    }

    pub fn mode(&self) -> HoldMode {
        self.controller.mode()
    }

    pub fn set_target_altitude_cm(&mut self, target_cm: i32) {
        self.controller.set_target_altitude_cm(target_cm as f32);
    }

    pub fn set_climb_rate_cm_s(&mut self, rate_cm_s: i32) {
        self.controller.set_climb_rate_cm_s(rate_cm_s as f32);
    }
}
