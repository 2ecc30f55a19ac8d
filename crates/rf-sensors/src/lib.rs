//! RF Sensors Library
//!
//! Emission propagation and the receivers that consume it:
//! - `Emission` value objects shared by `Arc` from transmitter to track manager
//! - `RfSystem` receiver noise floor, transmit power and a bounded, lock-guarded
//!   intake that antenna scans on any thread can feed
//! - `Antenna` gimbal-mounted beam pattern and per-target propagation
//! - `Rwr` double-buffered 360-ray angle-of-arrival display and report queue
//! - `Radar` pulse emitter counting its own skin echoes
//! - `Sensor` tagged variant over the concrete receiver kinds

use thiserror::Error;

pub mod antenna;
pub mod emission;
pub mod intake;
pub mod radar;
pub mod rf_system;
pub mod rwr;
pub mod sensor;

pub use antenna::{polarization_loss, Antenna, AntennaConfig, Receiver, SharedAntenna, TransmitStats};
pub use emission::{Emission, Polarization, SignalGeometry, TransmitterId, NEAR_FIELD_CUTOFF_M};
pub use intake::{EmissionIntake, PendingEmission};
pub use radar::{Detection, Radar, RadarConfig};
pub use rf_system::{RfParams, RfSystem};
pub use rwr::{RayBuffer, ReportQueue, Rwr, RwrConfig, NUM_RAYS};
pub use sensor::Sensor;

/// Capacity of the pending-emission intake and of the RWR report queue
pub const MAX_EMISSIONS: usize = 10_000;

/// Receives detections from a sensor's receive phase.
///
/// The emission is only borrowed for the duration of the call; an
/// implementation that needs it later must copy what it needs.
pub trait ReportSink {
    fn new_report(&mut self, emission: &Emission, sn_db: f64);
}

#[derive(Error, Debug, PartialEq)]
pub enum RfError {
    #[error("Invalid RF parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("Antenna gimbal: {0}")]
    Gimbal(#[from] gimbal::GimbalError),
}

pub type Result<T> = std::result::Result<T, RfError>;
