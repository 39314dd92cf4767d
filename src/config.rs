//! Tuning constants, grouped per component. Supplied once at construction;
//! nothing here adapts at runtime.

use crate::controller::VehicleType;
use crate::selector::RangeSensorKind;

#[derive(Clone, Copy)]
pub struct EstimatorConfig {
    /// Nominal control loop rate (Hz), used to pre-compute the accel LPF
    /// coefficients. The integrator itself uses the measured dt.
    pub nominal_rate_hz: f32,
    /// Vertical accel low-pass cutoff (Hz), ahead of integration.
    pub accel_lpf_cutoff_hz: f32,
    /// dt ceiling (s). One late cycle must not inject a position jump.
    pub max_dt_s: f32,
    /// Beyond this gap (s) the scheduler stalled: skip the cycle entirely.
    pub stalled_dt_s: f32,
    /// Altitude smoother noise. Higher R = smoother but laggy.
    pub alt_q: f32,
    pub alt_r: f32,
    /// Velocity smoother noise.
    pub vel_q: f32,
    pub vel_r: f32,
    /// Altitude the estimate starts from after init/reset (cm).
    pub initial_altitude_cm: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            nominal_rate_hz: 50.0,
            accel_lpf_cutoff_hz: 10.0,
            max_dt_s: 0.1,
            stalled_dt_s: 0.5,
            alt_q: 0.05,
            alt_r: 6.0,
            vel_q: 0.1,
            vel_r: 8.0,
            initial_altitude_cm: 0.0,
        }
    }
}

#[derive(Clone, Copy)]
pub struct SelectorConfig {
    /// Range sensor fitted to this airframe, chosen at configuration time.
    pub range_sensor: RangeSensorKind,
    pub min_range_cm: f32,
    pub max_range_cm: f32,
    /// Above this tilt the range sensor is unusable and baro trust drops.
    pub tilt_max_deg: f32,
    /// Barometer measurement latency (µs), compensated via the history queue.
    pub baro_latency_us: u32,
    /// Blending time constants (s). Smaller = faster trust of the correction.
    pub tof_time_constant_s: f32,
    pub baro_time_constant_s: f32,
    pub baro_tilted_time_constant_s: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            range_sensor: RangeSensorKind::Tof,
            min_range_cm: 20.0,
            max_range_cm: 350.0,
            tilt_max_deg: 25.0,
            baro_latency_us: 250_000,
            tof_time_constant_s: 1.5,
            baro_time_constant_s: 2.0,
            baro_tilted_time_constant_s: 5.0,
        }
    }
}

#[derive(Clone, Copy)]
pub struct PidGains {
    /// Altitude error (cm) → velocity setpoint (cm/s).
    pub alt_p: f32,
    /// Velocity error (cm/s) → throttle delta.
    pub vel_p: f32,
    pub vel_i: f32,
    /// Applied to smoothed vertical accel, damping instead of an error
    /// derivative.
    pub vel_d: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            alt_p: 0.6,
            vel_p: 0.8,
            vel_i: 0.25,
            vel_d: 0.02,
        }
    }
}

#[derive(Clone, Copy)]
pub struct AltHoldConfig {
    pub gains: PidGains,
    /// Velocity setpoint clamp in Hold mode (cm/s).
    pub max_climb_rate_cm_s: f32,
    /// Anti-windup bound on the accumulated I-term (throttle units).
    pub integrator_limit: f32,
    pub output_limit: f32,
    pub throttle_min: i32,
    pub throttle_max: i32,
    pub vehicle: VehicleType,
}

impl Default for AltHoldConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            max_climb_rate_cm_s: 250.0,
            integrator_limit: 150.0,
            output_limit: 250.0,
            throttle_min: 1050,
            throttle_max: 1950,
            vehicle: VehicleType::Multirotor,
        }
    }
}

/// Top-level configuration for one altitude-hold instance.
#[derive(Clone, Copy, Default)]
pub struct Config {
    pub estimator: EstimatorConfig,
    pub selector: SelectorConfig,
    pub hold: AltHoldConfig,
}
