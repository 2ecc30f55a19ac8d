//! Gimbal Library
//!
//! Servo-controlled 3-axis mounts for antennas and sensors:
//! - Freeze / rate / position servo laws with per-axis rate and angle limits
//! - Mechanical vs electronically-steered slew behaviour
//! - Gimbal → body frame chains (antenna-on-turret composition)
//! - Target Data Block (players of interest inside the sensing volume)

use thiserror::Error;

pub mod player;
pub mod servo;
pub mod tdb;
pub mod terrain;

pub use frame_math::Axis;
pub use player::{PlayerId, PlayerKind, PlayerState, TargetIdentity, ALL_PLAYER_KINDS};
pub use servo::{Gimbal, GimbalConfig, GimbalKind, ServoMode, DEFAULT_POSITION_TOLERANCE};
pub use tdb::{build_tdb, Tdb, TdbEntry, TdbFilter};
pub use terrain::{horizon_visible, FlatTerrain, Terrain};

#[derive(Error, Debug, PartialEq)]
pub enum GimbalError {
    #[error("Invalid {axis:?} limits: low {low} > high {high}")]
    InvalidLimits { axis: Axis, low: f64, high: f64 },
    #[error("Invalid {axis:?} max rate: {rate}")]
    InvalidMaxRate { axis: Axis, rate: f64 },
    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),
}

pub type Result<T> = std::result::Result<T, GimbalError>;
