//! Gimbal servo controller
//!
//! Three axes (azimuth, elevation, roll) driven by one of three control laws:
//! - Freeze: hold the current orientation
//! - Rate: follow a commanded rate, limited to the max rate on mechanical mounts
//! - Position: slew to a commanded orientation along the short way round
//!
//! Mechanical gimbals are always rate limited. Electronically-steered arrays
//! with fast slew enabled re-point in a single step.
//!
//! Angles are re-wrapped to (−π, π] after every step and then clamped against
//! the per-axis limits. The frame matrix `tm` maps gimbal coordinates into the
//! parent frame (ownship body or the parent gimbal) and is only refreshed by
//! `update_matrix()` / `servo_controller()`.

use crate::player::PlayerState;
use crate::tdb::{build_tdb, Tdb, TdbFilter};
use crate::terrain::Terrain;
use crate::{GimbalError, Result};
use frame_math::{
    angle_diff_rad, clamp_to_limits, compose, euler_rotation, frame_matrix, rotation_of, wrap_rad,
    Axis, Mat4, Vec3, DEG2RAD,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::sync::Arc;
use tracing::{debug, trace};

/// Settle tolerance for `is_positioned()` (0.1°)
pub const DEFAULT_POSITION_TOLERANCE: f64 = 0.1 * DEG2RAD;

/// Servo control law
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServoMode {
    #[default]
    Freeze,
    Rate,
    Position,
}

/// Physical type of the mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GimbalKind {
    #[default]
    Mechanical,
    Electronic,
}

/// Typed gimbal configuration. Angles in radians, rates in rad/s, location in meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GimbalConfig {
    pub name: String,
    pub kind: GimbalKind,
    pub location: [f64; 3],
    pub init_position: [f64; 3],
    pub azimuth_limits: [f64; 2],
    pub elevation_limits: [f64; 2],
    pub roll_limits: [f64; 2],
    pub max_rates: [f64; 3],
    pub fast_slew: bool,
    pub initial_servo: ServoMode,
    pub init_cmd_rate: [f64; 3],
    pub players_of_interest: TdbFilter,
    pub children: Vec<GimbalConfig>,
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self {
            name: "gimbal".to_string(),
            kind: GimbalKind::Mechanical,
            location: [0.0; 3],
            init_position: [0.0; 3],
            // outside [−π, π]: unlimited
            azimuth_limits: [-TAU, TAU],
            elevation_limits: [-TAU, TAU],
            roll_limits: [-TAU, TAU],
            max_rates: [PI; 3],
            fast_slew: true,
            initial_servo: ServoMode::Freeze,
            init_cmd_rate: [0.0; 3],
            players_of_interest: TdbFilter::default(),
            children: Vec::new(),
        }
    }
}

impl GimbalConfig {
    fn limits(&self, axis: Axis) -> [f64; 2] {
        match axis {
            Axis::Azimuth => self.azimuth_limits,
            Axis::Elevation => self.elevation_limits,
            Axis::Roll => self.roll_limits,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for axis in Axis::ALL {
            let [low, high] = self.limits(axis);
            if !low.is_finite() || !high.is_finite() {
                return Err(GimbalError::NonFinite("limits"));
            }
            if low > high {
                return Err(GimbalError::InvalidLimits { axis, low, high });
            }
            let rate = self.max_rates[axis.index()];
            if !rate.is_finite() || rate < 0.0 {
                return Err(GimbalError::InvalidMaxRate { axis, rate });
            }
        }
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        if !finite(&self.location) {
            return Err(GimbalError::NonFinite("location"));
        }
        if !finite(&self.init_position) {
            return Err(GimbalError::NonFinite("init_position"));
        }
        if !finite(&self.init_cmd_rate) {
            return Err(GimbalError::NonFinite("init_cmd_rate"));
        }
        for child in &self.children {
            child.validate()?;
        }
        Ok(())
    }
}

/// A servo-driven 3-axis mount
#[derive(Debug)]
pub struct Gimbal {
    name: String,
    kind: GimbalKind,
    servo_mode: ServoMode,
    fast_slew: bool,

    pos: Vec3,
    rate: Vec3,
    cmd_pos: Vec3,
    cmd_rate: Vec3,
    max_rate: Vec3,
    low_limits: Vec3,
    high_limits: Vec3,
    location: Vec3,
    at_limit: bool,

    // reset() targets
    init_pos: Vec3,
    init_cmd_rate: Vec3,
    init_servo: ServoMode,

    parent_tm: Mat4,
    tm: Mat4,
    children: Vec<Gimbal>,

    poi_filter: TdbFilter,
    tdb: RwLock<Arc<Tdb>>,
}

impl Gimbal {
    /// Identity orientation, zero rates, unlimited axes
    pub fn new(name: &str, kind: GimbalKind) -> Self {
        let defaults = GimbalConfig::default();
        let mut g = Self {
            name: name.to_string(),
            kind,
            servo_mode: ServoMode::Freeze,
            fast_slew: defaults.fast_slew,
            pos: Vec3::zeros(),
            rate: Vec3::zeros(),
            cmd_pos: Vec3::zeros(),
            cmd_rate: Vec3::zeros(),
            max_rate: Vec3::from(defaults.max_rates),
            low_limits: Vec3::repeat(-TAU),
            high_limits: Vec3::repeat(TAU),
            location: Vec3::zeros(),
            at_limit: false,
            init_pos: Vec3::zeros(),
            init_cmd_rate: Vec3::zeros(),
            init_servo: ServoMode::Freeze,
            parent_tm: Mat4::identity(),
            tm: Mat4::identity(),
            children: Vec::new(),
            poi_filter: defaults.players_of_interest,
            tdb: RwLock::new(Arc::new(Tdb::empty())),
        };
        g.update_matrix();
        g
    }

    pub fn from_config(config: &GimbalConfig) -> Result<Self> {
        config.validate()?;

        let mut g = Self::new(&config.name, config.kind);
        for axis in Axis::ALL {
            let i = axis.index();
            let [low, high] = config.limits(axis);
            g.low_limits[i] = low;
            g.high_limits[i] = high;
        }
        g.max_rate = Vec3::from(config.max_rates);
        g.location = Vec3::from(config.location);
        g.fast_slew = config.fast_slew;
        g.poi_filter = config.players_of_interest.clone();

        g.init_pos = g.limited(&Vec3::from(config.init_position)).0;
        g.init_cmd_rate = Vec3::from(config.init_cmd_rate);
        g.init_servo = config.initial_servo;

        for child in &config.children {
            g.children.push(Gimbal::from_config(child)?);
        }

        g.reset();
        debug!(gimbal = %g.name, kind = ?g.kind, children = g.children.len(), "gimbal configured");
        Ok(g)
    }

    /// Restore the configured orientation, commands and servo mode (recursive)
    pub fn reset(&mut self) {
        self.pos = self.init_pos;
        self.cmd_pos = self.init_pos;
        self.rate = Vec3::zeros();
        self.cmd_rate = self.init_cmd_rate;
        self.servo_mode = self.init_servo;
        self.at_limit = false;
        *self.tdb.write() = Arc::new(Tdb::empty());
        for child in &mut self.children {
            child.reset();
        }
        self.update_matrix();
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Switch control law; does not move the gimbal
    pub fn set_servo_mode(&mut self, mode: ServoMode) {
        self.servo_mode = mode;
    }

    /// Command a position (wrapped and limit-clamped) and enter position servo
    pub fn set_cmd_pos(&mut self, cmd: Vec3) -> bool {
        if !cmd.iter().all(|v| v.is_finite()) {
            return false;
        }
        self.cmd_pos = self.limited(&cmd).0;
        self.servo_mode = ServoMode::Position;
        true
    }

    /// Command a rate and enter rate servo. The rate itself is limited when
    /// the control law runs, not here.
    pub fn set_cmd_rate(&mut self, cmd: Vec3) -> bool {
        if !cmd.iter().all(|v| v.is_finite()) {
            return false;
        }
        self.cmd_rate = cmd;
        self.servo_mode = ServoMode::Rate;
        true
    }

    /// Place the gimbal directly (no slew); wrapped and limit-clamped
    pub fn set_position(&mut self, pos: Vec3) -> bool {
        if !pos.iter().all(|v| v.is_finite()) {
            return false;
        }
        self.pos = self.limited(&pos).0;
        self.update_matrix();
        true
    }

    pub fn set_max_rates(&mut self, rates: Vec3) -> bool {
        if !rates.iter().all(|r| r.is_finite() && *r >= 0.0) {
            return false;
        }
        self.max_rate = rates;
        true
    }

    pub fn set_limits(&mut self, axis: Axis, low: f64, high: f64) -> bool {
        if !low.is_finite() || !high.is_finite() || low > high {
            return false;
        }
        self.low_limits[axis.index()] = low;
        self.high_limits[axis.index()] = high;
        true
    }

    pub fn set_location(&mut self, location: Vec3) -> bool {
        if !location.iter().all(|v| v.is_finite()) {
            return false;
        }
        self.location = location;
        true
    }

    pub fn set_fast_slew(&mut self, enabled: bool) {
        self.fast_slew = enabled;
    }

    pub fn set_kind(&mut self, kind: GimbalKind) {
        self.kind = kind;
    }

    pub fn set_players_of_interest_filter(&mut self, filter: TdbFilter) {
        self.poi_filter = filter;
    }

    pub fn add_child(&mut self, mut child: Gimbal) {
        child.set_parent_matrix(self.tm);
        self.children.push(child);
    }

    // ------------------------------------------------------------------------
    // Dynamics
    // ------------------------------------------------------------------------

    /// Run the control law for one frame, then recompose the frame matrix and
    /// drive child gimbals. A zero (or invalid) `dt` changes no servo state.
    pub fn servo_controller(&mut self, dt: f64) {
        if dt > 0.0 && dt.is_finite() {
            match self.servo_mode {
                ServoMode::Freeze => self.at_limit = false,
                ServoMode::Rate => self.rate_servo(dt),
                ServoMode::Position => self.position_servo(dt),
            }
        }

        self.tm = self.local_matrix();
        for child in &mut self.children {
            child.parent_tm = self.tm;
            child.servo_controller(dt);
        }
    }

    fn position_servo(&mut self, dt: f64) {
        let rate_limited = self.kind == GimbalKind::Mechanical || !self.fast_slew;

        let mut step = Vec3::zeros();
        for i in 0..3 {
            let delta = angle_diff_rad(self.cmd_pos[i], self.pos[i]);
            step[i] = if rate_limited {
                let max = self.max_rate[i] * dt;
                delta.clamp(-max, max)
            } else {
                delta
            };
        }

        self.rate = step / dt;
        self.apply_step(&step);
    }

    fn rate_servo(&mut self, dt: f64) {
        let mut rate = self.cmd_rate;
        if self.kind == GimbalKind::Mechanical {
            for i in 0..3 {
                rate[i] = rate[i].clamp(-self.max_rate[i], self.max_rate[i]);
            }
        }

        self.rate = rate;
        self.apply_step(&(rate * dt));
    }

    fn apply_step(&mut self, step: &Vec3) {
        let (pos, clamped) = self.limited(&(self.pos + step));
        self.at_limit = false;
        for axis in Axis::ALL {
            let i = axis.index();
            if clamped[i] {
                self.at_limit = true;
                self.rate[i] = 0.0;
                trace!(gimbal = %self.name, ?axis, angle = pos[i], "axis at limit");
            }
        }
        self.pos = pos;
    }

    /// Wrap every axis, then clamp against the limits
    fn limited(&self, v: &Vec3) -> (Vec3, [bool; 3]) {
        let mut out = Vec3::zeros();
        let mut clamped = [false; 3];
        for i in 0..3 {
            let (a, c) = clamp_to_limits(wrap_rad(v[i]), self.low_limits[i], self.high_limits[i]);
            out[i] = a;
            clamped[i] = c;
        }
        (out, clamped)
    }

    // ------------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------------

    fn local_matrix(&self) -> Mat4 {
        let rotation = euler_rotation(self.pos[2], self.pos[1], self.pos[0]);
        compose(&self.parent_tm, &frame_matrix(&rotation, &self.location))
    }

    /// Recompose `tm = parent · T(location) · R(az, el, roll)` and push it to the children
    pub fn update_matrix(&mut self) {
        self.tm = self.local_matrix();
        for child in &mut self.children {
            child.set_parent_matrix(self.tm);
        }
    }

    /// Set the frame this gimbal is mounted in and recompose
    pub fn set_parent_matrix(&mut self, parent: Mat4) {
        self.parent_tm = parent;
        self.update_matrix();
    }

    /// Boresight unit vector in the root frame of the chain
    pub fn los_vector(&self) -> Vec3 {
        rotation_of(&self.tm) * Vec3::x()
    }

    /// Boresight azimuth/elevation in the root frame of the chain
    pub fn boresight_az_el(&self) -> (f64, f64) {
        frame_math::az_el_of(&self.los_vector())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Settled within the default 0.1° tolerance
    pub fn is_positioned(&self) -> bool {
        self.is_positioned_within(DEFAULT_POSITION_TOLERANCE)
    }

    /// Every axis within `tolerance` (wrapped) of the commanded position
    pub fn is_positioned_within(&self, tolerance: f64) -> bool {
        (0..3).all(|i| angle_diff_rad(self.pos[i], self.cmd_pos[i]).abs() <= tolerance)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GimbalKind {
        self.kind
    }

    pub fn servo_mode(&self) -> ServoMode {
        self.servo_mode
    }

    pub fn fast_slew(&self) -> bool {
        self.fast_slew
    }

    pub fn position(&self) -> Vec3 {
        self.pos
    }

    pub fn azimuth(&self) -> f64 {
        self.pos[0]
    }

    pub fn elevation(&self) -> f64 {
        self.pos[1]
    }

    pub fn roll(&self) -> f64 {
        self.pos[2]
    }

    pub fn rate(&self) -> Vec3 {
        self.rate
    }

    pub fn cmd_position(&self) -> Vec3 {
        self.cmd_pos
    }

    pub fn cmd_rate(&self) -> Vec3 {
        self.cmd_rate
    }

    pub fn max_rates(&self) -> Vec3 {
        self.max_rate
    }

    pub fn limits(&self, axis: Axis) -> (f64, f64) {
        (self.low_limits[axis.index()], self.high_limits[axis.index()])
    }

    pub fn location(&self) -> Vec3 {
        self.location
    }

    pub fn is_at_limit(&self) -> bool {
        self.at_limit
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.tm
    }

    pub fn children(&self) -> &[Gimbal] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Gimbal] {
        &mut self.children
    }

    // ------------------------------------------------------------------------
    // Players of interest
    // ------------------------------------------------------------------------

    /// Rebuild the Target Data Block and publish it whole.
    /// Returns the number of accepted players.
    pub fn process_players_of_interest(
        &self,
        ownship: &PlayerState,
        players: &[PlayerState],
        terrain: Option<&dyn Terrain>,
    ) -> usize {
        let tdb = build_tdb(&self.poi_filter, &self.tm, ownship, players, terrain);
        let count = tdb.len();
        *self.tdb.write() = Arc::new(tdb);
        trace!(gimbal = %self.name, count, "players of interest updated");
        count
    }

    /// Current Target Data Block snapshot
    pub fn tdb(&self) -> Arc<Tdb> {
        Arc::clone(&self.tdb.read())
    }

    pub fn players_of_interest_filter(&self) -> &TdbFilter {
        &self.poi_filter
    }
}
