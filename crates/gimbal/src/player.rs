//! Player snapshots
//!
//! The gimbal only ever reads players: an immutable identity shared by `Arc`
//! (tracks hold it as their strong target reference) plus a kinematic state
//! refreshed once per frame by the owning simulation.

use frame_math::{euler_rotation, frame_matrix, Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    Aircraft,
    Ship,
    Ground,
    Building,
    Weapon,
}

/// Mask with every `PlayerKind` bit set
pub const ALL_PLAYER_KINDS: u32 = 0x1F;

impl PlayerKind {
    pub fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

/// Identity of a player, shared by everything that refers to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetIdentity {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
}

/// Per-frame kinematic snapshot of a player (NED, meters / radians)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub identity: Arc<TargetIdentity>,
    /// Simulated by this process (as opposed to a networked copy)
    pub local: bool,
    pub active: bool,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// (roll, pitch, yaw)
    pub euler: Vec3,
    /// Radar cross section (m²)
    pub rcs: f64,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: &str, kind: PlayerKind) -> Self {
        Self {
            identity: Arc::new(TargetIdentity {
                id,
                name: name.to_string(),
                kind,
            }),
            local: true,
            active: true,
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
            euler: Vec3::zeros(),
            rcs: 1.0,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.identity.id
    }

    pub fn kind(&self) -> PlayerKind {
        self.identity.kind
    }

    /// Altitude above the local tangent plane
    pub fn altitude(&self) -> f64 {
        -self.position.z
    }

    pub fn heading(&self) -> f64 {
        self.euler.z
    }

    /// Body → world rotation
    pub fn body_rotation(&self) -> Mat3 {
        euler_rotation(self.euler.x, self.euler.y, self.euler.z)
    }

    /// Body → world frame matrix
    pub fn world_matrix(&self) -> Mat4 {
        frame_matrix(&self.body_rotation(), &self.position)
    }
}
