/// Sample and snapshot types exchanged with the surrounding firmware.
///
/// All types are `Copy` so a sampling task can hand the core an atomic
/// snapshot per cycle and the telemetry task can read results without
/// borrowing into the control loop.

// ── Sensor samples ────────────────────────────────────────────────────────────

/// Barometric altitude sample. `fresh` is set by the sampling task when the
/// reading was taken since the previous control cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Default)]
pub struct BaroSample {
    pub height_cm: f32,
    pub timestamp_us: u32,
    pub fresh: bool,
}

/// Range sensor (ToF/sonar) sample. Range and tilt gating is applied by the
/// correction selector, not the driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Default)]
pub struct RangeSample {
    pub height_cm: f32,
    pub timestamp_us: u32,
    pub fresh: bool,
}

/// Everything the core consumes in one control cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Default)]
pub struct CycleInputs {
    /// Vertical acceleration, earth frame, gravity removed (cm/s²).
    pub accel_z_cm_s2: f32,
    pub baro: BaroSample,
    pub range: RangeSample,
    /// Vehicle tilt from vertical (degrees).
    pub tilt_deg: f32,
}

// ── Correction ────────────────────────────────────────────────────────────────

/// Which sensor branch produced the position correction this cycle.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CorrectionSource {
    Tof,
    Baro,
    #[default]
    None,
}

/// Position-error signal and blending time constant fed into the estimator.
#[derive(Clone, Copy)]
pub struct Correction {
    pub position_error_cm: f32,
    pub time_constant_s: f32,
    pub source: CorrectionSource,
}

// ── Telemetry ────────────────────────────────────────────────────────────────

/// Read-only snapshot of the intermediate signals, refreshed every cycle.
/// Outputs only; feeding any of these back into the core is a caller bug.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct TelemetrySnapshot {
    pub est_alt_cm: f32,
    pub est_vel_cm_s: f32,
    pub position_error_cm: f32,
    pub time_constant_s: f32,
    pub source: CorrectionSource,
    pub velocity_valid: bool,
    /// Cycles since a sensor correction was last applied. Grows without bound
    /// during a dual-sensor outage, where the estimate drifts inertial-only.
    pub cycles_since_correction: u32,
    pub set_velocity_cm_s: f32,
    pub velocity_error_cm_s: f32,
    pub pid_p: f32,
    pub pid_i: f32,
    pub pid_d: f32,
    pub throttle_delta: i32,
}
