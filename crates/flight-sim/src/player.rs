//! Simulated player
//!
//! Owns the kinematic state, its RF sensors (and through them the shared
//! antennas), any stand-alone gimbals, and an optional track manager that the
//! sensors report into.

use gimbal::{Gimbal, PlayerId, PlayerState, Terrain};
use rf_sensors::{Sensor, SharedAntenna};
use std::sync::Arc;
use tracing::{debug, info};
use tracks::TrackManager;

pub struct Player {
    state: PlayerState,
    gimbals: Vec<Gimbal>,
    sensors: Vec<Sensor>,
    track_manager: Option<Box<dyn TrackManager>>,
    alive: bool,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.state.id())
            .field("name", &self.state.identity.name)
            .field("sensors", &self.sensors.len())
            .field("gimbals", &self.gimbals.len())
            .field("tracks", &self.track_manager.is_some())
            .field("alive", &self.alive)
            .finish()
    }
}

impl Player {
    pub fn new(state: PlayerState) -> Self {
        Self {
            state,
            gimbals: Vec::new(),
            sensors: Vec::new(),
            track_manager: None,
            alive: true,
        }
    }

    pub fn add_sensor(&mut self, sensor: Sensor) {
        self.sensors.push(sensor);
    }

    pub fn add_gimbal(&mut self, gimbal: Gimbal) {
        self.gimbals.push(gimbal);
    }

    pub fn set_track_manager(&mut self, tm: Option<Box<dyn TrackManager>>) {
        self.track_manager = tm;
    }

    pub fn id(&self) -> PlayerId {
        self.state.id()
    }

    pub fn name(&self) -> &str {
        &self.state.identity.name
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PlayerState {
        &mut self.state
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut [Sensor] {
        &mut self.sensors
    }

    pub fn gimbals(&self) -> &[Gimbal] {
        &self.gimbals
    }

    pub fn gimbals_mut(&mut self) -> &mut [Gimbal] {
        &mut self.gimbals
    }

    pub fn track_manager(&self) -> Option<&dyn TrackManager> {
        self.track_manager.as_deref()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Distinct antennas across all sensors (two sensors may share one)
    pub fn antennas(&self) -> Vec<SharedAntenna> {
        let mut out: Vec<SharedAntenna> = Vec::new();
        for antenna in self.sensors.iter().filter_map(|s| s.antenna()) {
            if !out.iter().any(|a| Arc::ptr_eq(a, antenna)) {
                out.push(Arc::clone(antenna));
            }
        }
        out
    }

    // ------------------------------------------------------------------------
    // Frame phases
    // ------------------------------------------------------------------------

    /// Constant-acceleration motion
    pub fn update_motion(&mut self, dt: f64) {
        if !self.alive || dt <= 0.0 {
            return;
        }
        let s = &mut self.state;
        s.velocity += s.acceleration * dt;
        s.position += s.velocity * dt;
    }

    /// Servo every gimbal and rebuild its Target Data Block against
    /// `players`. Returns the total number of TDB entries.
    pub fn update_gimbals(
        &mut self,
        dt: f64,
        players: &[PlayerState],
        terrain: Option<&dyn Terrain>,
    ) -> usize {
        if !self.alive {
            return 0;
        }
        let mut entries = 0;
        for antenna in self.antennas() {
            let mut antenna = antenna.write();
            antenna.gimbal_mut().servo_controller(dt);
            entries += antenna
                .gimbal()
                .process_players_of_interest(&self.state, players, terrain);
        }
        for gimbal in &mut self.gimbals {
            gimbal.servo_controller(dt);
            entries += gimbal.process_players_of_interest(&self.state, players, terrain);
        }
        entries
    }

    /// Drain every sensor's intake (RWR reports go to the track manager),
    /// then publish the RWR rays. Returns the number of reports.
    pub fn receive(&mut self, dt: f64) -> usize {
        let mut reported = 0;
        for sensor in &mut self.sensors {
            let sink = self.track_manager.as_deref_mut().map(|tm| tm.as_report_sink());
            let n = sensor.receive(dt, sink);
            if sensor.as_rwr().is_some() {
                reported += n;
            }
        }
        for sensor in &mut self.sensors {
            sensor.xfer_rays();
        }
        reported
    }

    /// Sensor post-processing and the track manager update.
    /// Returns the number of queued reports consumed.
    pub fn process(&mut self, dt: f64) -> usize {
        let consumed = self.sensors.iter_mut().map(|s| s.process(dt)).sum();
        if self.alive {
            if let Some(tm) = self.track_manager.as_deref_mut() {
                tm.process(dt, &self.state);
            }
        }
        consumed
    }

    /// Radar detections from the last receive phase
    pub fn detections(&self) -> usize {
        self.sensors
            .iter()
            .filter_map(Sensor::as_radar)
            .map(|r| r.detections().len())
            .sum()
    }

    /// Number of live tracks
    pub fn track_count(&self) -> usize {
        self.track_manager.as_ref().map_or(0, |tm| tm.tracks().len())
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Remove the player from play: it drops out of every TDB and its
    /// sensors release what they hold.
    pub fn kill(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.state.active = false;
        for sensor in &mut self.sensors {
            sensor.killed_notification();
        }
        if let Some(tm) = self.track_manager.as_deref_mut() {
            tm.clear();
        }
        info!(player = %self.id(), name = %self.name(), "player killed");
    }

    pub fn shutdown(&mut self) {
        for sensor in &mut self.sensors {
            sensor.shutdown_notification();
        }
        if let Some(tm) = self.track_manager.as_deref_mut() {
            tm.clear();
        }
        debug!(player = %self.id(), "player shut down");
    }

    /// Back to the initial sensor and gimbal state; kinematics are kept
    pub fn reset(&mut self) {
        for sensor in &mut self.sensors {
            sensor.reset();
        }
        for antenna in self.antennas() {
            antenna.write().gimbal_mut().reset();
        }
        for gimbal in &mut self.gimbals {
            gimbal.reset();
        }
        if let Some(tm) = self.track_manager.as_deref_mut() {
            tm.clear();
        }
        self.alive = true;
        self.state.active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_math::Vec3;
    use gimbal::{GimbalKind, PlayerKind, ServoMode};
    use rf_sensors::{Antenna, RfSystem, Rwr, TransmitterId};
    use tracks::RwrTrackManager;

    fn aircraft(id: u32) -> PlayerState {
        PlayerState::new(PlayerId(id), "jet", PlayerKind::Aircraft)
    }

    fn rwr_on(antenna: &SharedAntenna, id: u32) -> Sensor {
        let mut rf = RfSystem::new(TransmitterId(id), "rwr");
        rf.set_antenna(Some(Arc::clone(antenna)));
        Sensor::Rwr(Rwr::new(rf))
    }

    #[test]
    fn test_motion_integrates() {
        let mut p = Player::new(aircraft(1));
        p.state_mut().velocity = Vec3::new(100.0, 0.0, 0.0);
        p.state_mut().acceleration = Vec3::new(0.0, 10.0, 0.0);
        p.update_motion(1.0);
        assert_eq!(p.state().velocity, Vec3::new(100.0, 10.0, 0.0));
        assert_eq!(p.state().position, Vec3::new(100.0, 10.0, 0.0));

        p.update_motion(0.0);
        assert_eq!(p.state().position, Vec3::new(100.0, 10.0, 0.0));
    }

    #[test]
    fn test_shared_antenna_is_servoed_once() {
        let mut gimbal = Gimbal::new("ant", GimbalKind::Mechanical);
        gimbal.set_servo_mode(ServoMode::Rate);
        gimbal.set_cmd_rate(Vec3::new(0.1, 0.0, 0.0));
        let antenna = Antenna::new(gimbal).into_shared();

        let mut p = Player::new(aircraft(1));
        p.add_sensor(rwr_on(&antenna, 1));
        p.add_sensor(rwr_on(&antenna, 2));
        assert_eq!(p.antennas().len(), 1);

        p.update_gimbals(1.0, &[], None);
        assert!((antenna.read().gimbal().azimuth() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_tdb_built_from_snapshot() {
        let antenna = Antenna::new(Gimbal::new("ant", GimbalKind::Electronic)).into_shared();
        let mut p = Player::new(aircraft(1));
        p.add_sensor(rwr_on(&antenna, 1));

        let mut other = aircraft(2);
        other.position = Vec3::new(5000.0, 0.0, 0.0);
        let players = vec![p.state().clone(), other];
        assert_eq!(p.update_gimbals(0.05, &players, None), 1);
        assert_eq!(antenna.read().gimbal().tdb().len(), 1);
    }

    #[test]
    fn test_kill_leaves_play() {
        let antenna = Antenna::new(Gimbal::new("ant", GimbalKind::Electronic)).into_shared();
        let mut p = Player::new(aircraft(1));
        p.add_sensor(rwr_on(&antenna, 1));
        p.set_track_manager(Some(Box::new(RwrTrackManager::default())));

        p.kill();
        assert!(!p.is_alive());
        assert!(!p.state().active);
        assert_eq!(p.update_gimbals(0.05, &[], None), 0);
        assert_eq!(p.track_count(), 0);

        p.reset();
        assert!(p.is_alive());
        assert!(p.state().active);
    }
}
