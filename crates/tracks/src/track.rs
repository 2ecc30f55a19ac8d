//! Track state
//!
//! Position, velocity and acceleration are local NED relative to ownship.
//! Setters are independent except `set_position` (range, bearing, elevation,
//! line of sight and the residuals against the last prediction) and
//! `set_velocity` (ground speed, ground track, aspect angle, range rate).

use frame_math::{wrap_rad, Vec3};
use gimbal::{PlayerId, TargetIdentity};
use rf_sensors::TransmitterId;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::BitOr;
use std::sync::Arc;

/// Track type bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TrackKind(pub u32);

impl TrackKind {
    pub const NONE: TrackKind = TrackKind(0);
    pub const AIR: TrackKind = TrackKind(0x01);
    pub const GND: TrackKind = TrackKind(0x02);
    pub const RWR: TrackKind = TrackKind(0x04);
    pub const ONBOARD_SENSOR: TrackKind = TrackKind(0x08);

    pub fn contains(self, other: TrackKind) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TrackKind {
    type Output = TrackKind;

    fn bitor(self, rhs: TrackKind) -> TrackKind {
        TrackKind(self.0 | rhs.0)
    }
}

const CURRENT: usize = 0;
const PREDICTED: usize = 1;

#[derive(Debug, Clone, Default)]
pub struct Track {
    id: u32,
    kind: TrackKind,
    iff_code: u32,
    age: f64,
    quality: f64,

    pos: Vec3,
    vel: Vec3,
    accel: Vec3,
    los: Vec3,

    /// Relative azimuth (current, predicted)
    raz: [f64; 2],
    /// Relative elevation (current, predicted)
    rel: [f64; 2],
    gnd_rng: f64,
    rng: f64,
    rng_rate: f64,
    taz: f64,
    aa: f64,
    gnd_spd: f64,
    gnd_trk: f64,
    rel_gnd_trk: f64,
    c_err: f64,
    v_err: f64,

    own_heading: f64,
    own_vel: Vec3,

    tgt: Option<Arc<TargetIdentity>>,
    shoot_list: Option<u32>,
    wpn_rel: bool,
    rejected: bool,

    signal_db: f64,
    frequency: f64,
    emitter: Option<TransmitterId>,
}

impl Track {
    pub fn new(id: u32, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            ..Self::default()
        }
    }

    /// Back to the just-constructed state (the target reference is released)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ------------------------------------------------------------------------
    // Kinematics
    // ------------------------------------------------------------------------

    /// Ownship heading (rad) and NED velocity, used for relative bearings and
    /// ground velocity
    pub fn set_ownship_dynamics(&mut self, heading: f64, velocity: Vec3) {
        self.own_heading = heading;
        self.own_vel = velocity;
    }

    /// Relative position (NED, m). Recomputes range, ground range, true and
    /// relative azimuth, elevation and line of sight; cross-range and vertical
    /// residuals are measured against the last `predict`.
    pub fn set_position(&mut self, pos: Vec3) {
        self.pos = pos;
        self.gnd_rng = (pos.x * pos.x + pos.y * pos.y).sqrt();
        self.rng = pos.norm();
        self.taz = pos.y.atan2(pos.x);
        self.raz[CURRENT] = wrap_rad(self.taz - self.own_heading);
        self.rel[CURRENT] = (-pos.z).atan2(self.gnd_rng);
        if self.rng > 0.0 {
            self.los = pos / self.rng;
        }
        self.c_err = self.rng * wrap_rad(self.raz[CURRENT] - self.raz[PREDICTED]);
        self.v_err = self.rng * (self.rel[CURRENT] - self.rel[PREDICTED]);
    }

    /// Angle-only update for passive tracks: bearing and elevation without a
    /// range. Range-derived values are left alone.
    pub fn set_bearing(&mut self, true_azimuth: f64, elevation: f64) {
        self.taz = wrap_rad(true_azimuth);
        self.raz[CURRENT] = wrap_rad(self.taz - self.own_heading);
        self.rel[CURRENT] = wrap_rad(elevation);
        let (se, ce) = elevation.sin_cos();
        let (sa, ca) = self.taz.sin_cos();
        self.los = Vec3::new(ce * ca, ce * sa, -se);
    }

    /// Relative velocity (NED, m/s). Ground velocity is ownship + relative.
    pub fn set_velocity(&mut self, vel: Vec3) {
        self.vel = vel;
        let ground = self.own_vel + vel;
        self.gnd_spd = (ground.x * ground.x + ground.y * ground.y).sqrt();
        self.gnd_trk = ground.y.atan2(ground.x);
        self.rel_gnd_trk = wrap_rad(self.gnd_trk - self.own_heading);
        // bearing from the target back to ownship, relative to its track
        self.aa = wrap_rad(self.taz + PI - self.gnd_trk);
        self.rng_rate = if self.rng > 0.0 { vel.dot(&self.los) } else { 0.0 };
    }

    pub fn set_acceleration(&mut self, accel: Vec3) {
        self.accel = accel;
    }

    /// Predict the relative azimuth and elevation `dt` ahead
    pub fn predict(&mut self, dt: f64) {
        let p = self.pos + self.vel * dt + self.accel * (0.5 * dt * dt);
        let gnd = (p.x * p.x + p.y * p.y).sqrt();
        self.raz[PREDICTED] = wrap_rad(p.y.atan2(p.x) - self.own_heading);
        self.rel[PREDICTED] = (-p.z).atan2(gnd);
    }

    pub fn set_predicted_angles(&mut self, raz: f64, rel: f64) {
        self.raz[PREDICTED] = wrap_rad(raz);
        self.rel[PREDICTED] = wrap_rad(rel);
    }

    pub fn update_age(&mut self, dt: f64) {
        self.age += dt;
    }

    pub fn reset_age(&mut self) {
        self.age = 0.0;
    }

    // ------------------------------------------------------------------------
    // Identity and bookkeeping
    // ------------------------------------------------------------------------

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn set_kind(&mut self, kind: TrackKind) {
        self.kind = kind;
    }

    pub fn set_iff_code(&mut self, code: u32) {
        self.iff_code = code;
    }

    pub fn set_quality(&mut self, q: f64) {
        self.quality = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    }

    /// Replace the strong target reference (None releases it)
    pub fn set_target(&mut self, tgt: Option<Arc<TargetIdentity>>) {
        self.tgt = tgt;
    }

    pub fn set_shoot_list(&mut self, index: Option<u32>) {
        self.shoot_list = index;
    }

    pub fn set_weapon_released(&mut self, released: bool) {
        self.wpn_rel = released;
    }

    pub fn set_rejected(&mut self, rejected: bool) {
        self.rejected = rejected;
    }

    pub fn set_signal_db(&mut self, db: f64) {
        self.signal_db = db;
    }

    pub fn set_frequency(&mut self, hz: f64) {
        self.frequency = hz;
    }

    pub fn set_emitter(&mut self, tx: Option<TransmitterId>) {
        self.emitter = tx;
    }

    // ------------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------------

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn iff_code(&self) -> u32 {
        self.iff_code
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn position(&self) -> Vec3 {
        self.pos
    }

    pub fn velocity(&self) -> Vec3 {
        self.vel
    }

    pub fn acceleration(&self) -> Vec3 {
        self.accel
    }

    pub fn los(&self) -> Vec3 {
        self.los
    }

    pub fn range(&self) -> f64 {
        self.rng
    }

    pub fn ground_range(&self) -> f64 {
        self.gnd_rng
    }

    pub fn range_rate(&self) -> f64 {
        self.rng_rate
    }

    pub fn true_azimuth(&self) -> f64 {
        self.taz
    }

    pub fn relative_azimuth(&self) -> f64 {
        self.raz[CURRENT]
    }

    pub fn predicted_relative_azimuth(&self) -> f64 {
        self.raz[PREDICTED]
    }

    pub fn relative_elevation(&self) -> f64 {
        self.rel[CURRENT]
    }

    pub fn predicted_relative_elevation(&self) -> f64 {
        self.rel[PREDICTED]
    }

    pub fn aspect_angle(&self) -> f64 {
        self.aa
    }

    pub fn ground_speed(&self) -> f64 {
        self.gnd_spd
    }

    pub fn ground_track(&self) -> f64 {
        self.gnd_trk
    }

    pub fn relative_ground_track(&self) -> f64 {
        self.rel_gnd_trk
    }

    pub fn cross_range_error(&self) -> f64 {
        self.c_err
    }

    pub fn vertical_error(&self) -> f64 {
        self.v_err
    }

    pub fn target(&self) -> Option<&Arc<TargetIdentity>> {
        self.tgt.as_ref()
    }

    pub fn target_id(&self) -> Option<PlayerId> {
        self.tgt.as_ref().map(|t| t.id)
    }

    pub fn shoot_list(&self) -> Option<u32> {
        self.shoot_list
    }

    pub fn is_weapon_released(&self) -> bool {
        self.wpn_rel
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    pub fn signal_db(&self) -> f64 {
        self.signal_db
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn emitter(&self) -> Option<TransmitterId> {
        self.emitter
    }

    pub fn snapshot(&self) -> TrackRecord {
        TrackRecord {
            id: self.id,
            kind: self.kind.0,
            iff_code: self.iff_code,
            age: self.age,
            quality: self.quality,
            position: self.pos.into(),
            velocity: self.vel.into(),
            range: self.rng,
            range_rate: self.rng_rate,
            true_azimuth: self.taz,
            relative_azimuth: self.raz[CURRENT],
            relative_elevation: self.rel[CURRENT],
            ground_speed: self.gnd_spd,
            ground_track: self.gnd_trk,
            aspect_angle: self.aa,
            target: self.target_id(),
            target_name: self.tgt.as_ref().map(|t| t.name.clone()),
            signal_db: self.signal_db,
            emitter: self.emitter,
        }
    }
}

/// Serializable snapshot for recorders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: u32,
    pub kind: u32,
    pub iff_code: u32,
    pub age: f64,
    pub quality: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub range: f64,
    pub range_rate: f64,
    pub true_azimuth: f64,
    pub relative_azimuth: f64,
    pub relative_elevation: f64,
    pub ground_speed: f64,
    pub ground_track: f64,
    pub aspect_angle: f64,
    pub target: Option<PlayerId>,
    pub target_name: Option<String>,
    pub signal_db: f64,
    pub emitter: Option<TransmitterId>,
}
