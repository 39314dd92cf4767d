#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::AltHoldConfig;

/// Altitude-hold mode. Disabled is the initial state and the disarm target;
/// the controller computes nothing and emits a zero delta while in it.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum HoldMode {
    #[default]
    Disabled,
    Hold,
    VelocityControl,
}

/// How the throttle delta is mixed into the command downstream.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VehicleType {
    Multirotor,
    FixedWing,
}

/// PID terms from the last evaluation, published for telemetry only.
#[derive(Clone, Copy, Default)]
pub struct PidTerms {
    pub set_velocity: f32,
    pub velocity_error: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

/// Velocity-PID altitude-hold controller. Consumes the fused estimate and
/// emits an additive throttle delta; applying that delta to the pilot
/// command is the mixer's job.
pub struct AltHoldController {
    config: AltHoldConfig,
    mode: HoldMode,
    target_altitude_cm: f32,
    /// Pilot climb-rate command for VelocityControl, already mapped to cm/s.
    commanded_climb_rate_cm_s: f32,
    integrator_vel: f32,
    prev_accel: f32,
    terms: PidTerms,
}

impl AltHoldController {
    pub fn new(config: AltHoldConfig) -> Self {
        let config = AltHoldConfig {
            max_climb_rate_cm_s: config.max_climb_rate_cm_s.abs(),
            integrator_limit: config.integrator_limit.abs(),
            output_limit: config.output_limit.abs(),
            ..config
        };
        Self {
            config,
            mode: HoldMode::Disabled,
            target_altitude_cm: 0.0,
            commanded_climb_rate_cm_s: 0.0,
            integrator_vel: 0.0,
            prev_accel: 0.0,
            terms: PidTerms::default(),
        }
    }

    /// Entering an active state discards accumulated PID state so stale
    /// integral error never carries across a mode switch.
    pub fn set_mode(&mut self, mode: HoldMode) {
        if mode != self.mode && mode != HoldMode::Disabled {
            self.integrator_vel = 0.0;
            self.prev_accel = 0.0;
        }
        #[cfg(feature = "defmt")]
        if mode != self.mode {
            defmt::debug!("hold mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> HoldMode {
        self.mode
    }

    pub fn set_target_altitude_cm(&mut self, target_cm: f32) {
        self.target_altitude_cm = target_cm;
    }

    pub fn set_climb_rate_cm_s(&mut self, rate_cm_s: f32) {
        self.commanded_climb_rate_cm_s = rate_cm_s;
    }

    /// One PID evaluation on the current estimate. `accel_cm_s2` is the
    /// smoothed vertical acceleration this cycle; the previous cycle's value
    /// is kept here for the damping term.
    pub fn update(&mut self, dt: f32, est_alt_cm: f32, velocity_cm_s: f32, accel_cm_s2: f32) -> i32 {
        let g = self.config.gains;

        let set_velocity = match self.mode {
            HoldMode::Disabled => {
                self.terms = PidTerms::default();
                return 0;
            }
            HoldMode::Hold => (g.alt_p * (self.target_altitude_cm - est_alt_cm)).clamp(
                -self.config.max_climb_rate_cm_s,
                self.config.max_climb_rate_cm_s,
            ),
            HoldMode::VelocityControl => self.commanded_climb_rate_cm_s,
        };

        let velocity_error = set_velocity - velocity_cm_s;

        let p = g.vel_p * velocity_error;

        self.integrator_vel = (self.integrator_vel + g.vel_i * velocity_error * dt)
            .clamp(-self.config.integrator_limit, self.config.integrator_limit);

        // Damping from smoothed acceleration rather than a derivative of the
        // velocity error, which would amplify noise.
        let d = g.vel_d * (accel_cm_s2 + self.prev_accel);
        self.prev_accel = accel_cm_s2;

        let delta = (p + self.integrator_vel - d)
            .clamp(-self.config.output_limit, self.config.output_limit);

        self.terms = PidTerms {
            set_velocity,
            velocity_error,
            p,
            i: self.integrator_vel,
            d,
        };
        delta as i32
    }

    /// Vehicle-specific application of the hold delta onto a throttle
    /// command. Fixed wings get half authority; pressure-driven throttle
    /// swings couple into airspeed there.
    pub fn apply_hold(&self, throttle_cmd: i32, delta: i32) -> i32 {
        let delta = match self.config.vehicle {
            VehicleType::Multirotor => delta,
            VehicleType::FixedWing => delta / 2,
        };
        (throttle_cmd + delta).clamp(self.config.throttle_min, self.config.throttle_max)
    }

    pub fn reset(&mut self) {
        self.mode = HoldMode::Disabled;
        self.integrator_vel = 0.0;
        self.prev_accel = 0.0;
        self.terms = PidTerms::default();
    }

    pub fn pid_terms(&self) -> PidTerms {
        self.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn controller() -> AltHoldController {
        AltHoldController::new(AltHoldConfig::default())
    }

    #[test]
    fn test_disabled_emits_zero() {
        let mut c = controller();
        assert_eq!(c.update(DT, 120.0, -40.0, 90.0), 0);
        assert_eq!(c.pid_terms().i, 0.0);
    }

    #[test]
    fn test_hold_climbs_toward_target() {
        let mut c = controller();
        c.set_mode(HoldMode::Hold);
        c.set_target_altitude_cm(200.0);
        // Well below target, not moving: positive throttle delta
        let delta = c.update(DT, 100.0, 0.0, 0.0);
        assert!(delta > 0);

        // Above target: negative delta
        let delta = c.update(DT, 300.0, 0.0, 0.0);
        assert!(delta < 0);
    }

    #[test]
    fn test_hold_setpoint_is_rate_limited() {
        let mut c = controller();
        c.set_mode(HoldMode::Hold);
        c.set_target_altitude_cm(100_000.0);
        c.update(DT, 0.0, 0.0, 0.0);
        let cfg = AltHoldConfig::default();
        assert!((c.pid_terms().set_velocity - cfg.max_climb_rate_cm_s).abs() < 1e-6);
    }

    #[test]
    fn test_zero_error_leaves_only_integrator() {
        let mut c = controller();
        c.set_mode(HoldMode::VelocityControl);

        // Build up some integral first
        c.set_climb_rate_cm_s(100.0);
        for _ in 0..50 {
            c.update(DT, 0.0, 0.0, 0.0);
        }
        let integrator = c.pid_terms().i;
        assert!(integrator > 0.0);

        // Setpoint matches measured velocity, zero accel: P = D = 0 and the
        // integrator must neither grow nor decay
        c.set_climb_rate_cm_s(50.0);
        for _ in 0..100 {
            let delta = c.update(DT, 0.0, 50.0, 0.0);
            assert_eq!(delta, integrator as i32);
        }
        assert_eq!(c.pid_terms().i, integrator);
        assert_eq!(c.pid_terms().p, 0.0);
        assert_eq!(c.pid_terms().d, 0.0);
    }

    #[test]
    fn test_integrator_clamped() {
        let mut c = controller();
        c.set_mode(HoldMode::VelocityControl);
        c.set_climb_rate_cm_s(250.0);
        for _ in 0..10_000 {
            c.update(DT, 0.0, 0.0, 0.0);
        }
        let cfg = AltHoldConfig::default();
        assert!(c.pid_terms().i <= cfg.integrator_limit);
    }

    #[test]
    fn test_mode_switch_resets_integrator() {
        let mut c = controller();
        c.set_mode(HoldMode::VelocityControl);
        c.set_climb_rate_cm_s(200.0);
        for _ in 0..50 {
            c.update(DT, 0.0, 0.0, 0.0);
        }
        assert!(c.pid_terms().i > 0.0);

        c.set_mode(HoldMode::Hold);
        c.set_target_altitude_cm(0.0);
        c.update(DT, 0.0, 0.0, 0.0);
        // Only one cycle of fresh integral may be present
        let cfg = AltHoldConfig::default();
        assert!(c.pid_terms().i.abs() <= cfg.gains.vel_i * cfg.max_climb_rate_cm_s * DT + 1e-6);
    }

    #[test]
    fn test_reentering_same_mode_keeps_integrator() {
        let mut c = controller();
        c.set_mode(HoldMode::Hold);
        c.set_target_altitude_cm(500.0);
        for _ in 0..50 {
            c.update(DT, 0.0, 0.0, 0.0);
        }
        let integrator = c.pid_terms().i;
        c.set_mode(HoldMode::Hold);
        c.update(DT, 0.0, 0.0, 0.0);
        assert!(c.pid_terms().i >= integrator);
    }

    #[test]
    fn test_accel_damping_opposes_motion() {
        let mut c = controller();
        c.set_mode(HoldMode::VelocityControl);
        c.set_climb_rate_cm_s(0.0);
        c.update(DT, 0.0, 0.0, 400.0);
        let braking = c.update(DT, 0.0, 0.0, 400.0);
        c.reset();
        c.set_mode(HoldMode::VelocityControl);
        c.set_climb_rate_cm_s(0.0);
        c.update(DT, 0.0, 0.0, 0.0);
        let coasting = c.update(DT, 0.0, 0.0, 0.0);
        assert!(braking < coasting);
    }

    #[test]
    fn test_apply_hold_clamps_to_throttle_range() {
        let c = controller();
        let cfg = AltHoldConfig::default();
        assert_eq!(c.apply_hold(1500, 100), 1600);
        assert_eq!(c.apply_hold(1900, 300), cfg.throttle_max);
        assert_eq!(c.apply_hold(1100, -300), cfg.throttle_min);
    }

    #[test]
    fn test_fixed_wing_reduced_authority() {
        let config = AltHoldConfig {
            vehicle: VehicleType::FixedWing,
            ..AltHoldConfig::default()
        };
        let c = AltHoldController::new(config);
        assert_eq!(c.apply_hold(1500, 100), 1550);
    }
}
