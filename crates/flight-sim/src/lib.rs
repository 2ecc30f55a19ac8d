//! Flight Sim Library
//!
//! Owns players and their sensors and drives them through the per-frame
//! phases:
//! 1. dynamics: motion, gimbal servos, Target Data Blocks
//! 2. transmit: every emitter's antenna scans in parallel into receiver intakes
//! 3. receive: each sensor drains its intake; RWR rays are published
//! 4. process: report queues, track managers, recorder
//!
//! Scenarios are JSON documents loaded by `scenario::load_scenario`.

use thiserror::Error;

pub mod player;
pub mod scenario;
pub mod simulation;

pub use player::Player;
pub use scenario::{load_scenario, PlayerConfig, ScenarioConfig, SensorConfig};
pub use simulation::{FrameStats, Simulation};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f64),
    #[error("Gimbal: {0}")]
    Gimbal(#[from] gimbal::GimbalError),
    #[error("RF: {0}")]
    Rf(#[from] rf_sensors::RfError),
    #[error("Tracks: {0}")]
    Track(#[from] tracks::TrackError),
}

pub type Result<T> = std::result::Result<T, SimError>;
