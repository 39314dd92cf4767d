#![cfg_attr(not(test), no_std)]

//! Vertical-state estimation and altitude-hold control core.
//!
//! Fuses gravity-compensated vertical acceleration with barometric and
//! optional short-range time-of-flight measurements into one estimate of
//! altitude and climb rate, then drives a throttle correction to hold or
//! change altitude. The surrounding firmware owns the scheduler, sensor
//! drivers and mixer; this crate is called once per control cycle with an
//! already-validated sensor snapshot and performs no I/O of its own.

pub mod alt_hold;
pub mod config;
pub mod controller;
pub mod estimator;
pub mod filter;
pub mod history;
pub mod selector;
pub mod state;

pub use alt_hold::AltitudeHold;
pub use config::Config;
pub use controller::{HoldMode, VehicleType};
pub use selector::RangeSensorKind;
pub use state::{BaroSample, CorrectionSource, CycleInputs, RangeSample, TelemetrySnapshot};
