//! Target Data Block
//!
//! Per-frame list of players inside a gimbal's sensing volume, with their
//! geometry relative to the gimbal boresight. A `Tdb` is built whole and
//! published by swapping an `Arc`; it is never edited after construction.

use crate::player::{PlayerId, PlayerState, TargetIdentity, ALL_PLAYER_KINDS};
use crate::terrain::{horizon_visible, Terrain};
use frame_math::{az_el_of, inverse_rotate_vector, translation_of, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum separation for a player to be considered (m)
const MIN_RANGE_M: f64 = 1e-3;

/// Players-of-interest filter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TdbFilter {
    pub max_players: usize,
    /// Maximum slant range (m); `None` = unlimited
    pub max_range: Option<f64>,
    /// Maximum angle off boresight (rad); `None` = unlimited
    pub max_angle: Option<f64>,
    pub local_only: bool,
    /// `PlayerKind` bitmask of acceptable targets
    pub kind_mask: u32,
    pub terrain_occulting: bool,
    pub horizon_check: bool,
}

impl Default for TdbFilter {
    fn default() -> Self {
        Self {
            max_players: 200,
            max_range: None,
            max_angle: None,
            local_only: false,
            kind_mask: ALL_PLAYER_KINDS,
            terrain_occulting: false,
            horizon_check: true,
        }
    }
}

/// One accepted player
#[derive(Debug, Clone)]
pub struct TdbEntry {
    pub target: Arc<TargetIdentity>,
    /// Gimbal origin → target (m)
    pub range: f64,
    /// Positive when opening (m/s)
    pub range_rate: f64,
    /// Target position minus gimbal origin, world NED (m)
    pub relative_position: Vec3,
    /// Unit line of sight, world NED
    pub los_world: Vec3,
    /// Unit line of sight, gimbal frame
    pub los_gimbal: Vec3,
    /// Azimuth/elevation of the target in the gimbal frame (rad)
    pub az_gimbal: f64,
    pub el_gimbal: f64,
    /// Angle between boresight and line of sight (rad)
    pub off_boresight: f64,
    /// Target radar cross section (m²)
    pub rcs: f64,
}

/// Immutable snapshot of players of interest, sorted by range
#[derive(Debug, Clone, Default)]
pub struct Tdb {
    pub ownship: Option<PlayerId>,
    /// Gimbal origin, world NED
    pub origin: Vec3,
    entries: Vec<TdbEntry>,
}

impl Tdb {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TdbEntry] {
        &self.entries
    }

    pub fn find(&self, id: PlayerId) -> Option<&TdbEntry> {
        self.entries.iter().find(|e| e.target.id == id)
    }
}

/// Filter `players` against `filter` as seen from a gimbal.
///
/// `gimbal_tm` is the gimbal frame relative to the ownship body frame.
pub fn build_tdb(
    filter: &TdbFilter,
    gimbal_tm: &Mat4,
    ownship: &PlayerState,
    players: &[PlayerState],
    terrain: Option<&dyn Terrain>,
) -> Tdb {
    let body = ownship.body_rotation();
    let origin = ownship.position + body * translation_of(gimbal_tm);

    let mut entries: Vec<TdbEntry> = players
        .iter()
        .filter(|p| p.id() != ownship.id() && p.active)
        .filter(|p| !filter.local_only || p.local)
        .filter(|p| filter.kind_mask & p.kind().mask() != 0)
        .filter_map(|p| {
            let rel = p.position - origin;
            let range = rel.norm();
            if range < MIN_RANGE_M {
                return None;
            }
            if filter.max_range.is_some_and(|max| range > max) {
                return None;
            }
            if filter.horizon_check && !horizon_visible(-origin.z, p.altitude(), range) {
                return None;
            }

            let los_world = rel / range;
            let los_body = body.transpose() * los_world;
            let los_gimbal = inverse_rotate_vector(gimbal_tm, &los_body);
            let off_boresight = los_gimbal.x.clamp(-1.0, 1.0).acos();
            if filter.max_angle.is_some_and(|max| off_boresight > max) {
                return None;
            }

            if filter.terrain_occulting {
                if let Some(t) = terrain {
                    if t.occulted(&origin, &p.position) {
                        return None;
                    }
                }
            }

            let (az_gimbal, el_gimbal) = az_el_of(&los_gimbal);
            Some(TdbEntry {
                target: Arc::clone(&p.identity),
                range,
                range_rate: (p.velocity - ownship.velocity).dot(&los_world),
                relative_position: rel,
                los_world,
                los_gimbal,
                az_gimbal,
                el_gimbal,
                off_boresight,
                rcs: p.rcs,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.range.total_cmp(&b.range));
    entries.truncate(filter.max_players);

    Tdb {
        ownship: Some(ownship.id()),
        origin,
        entries,
    }
}
