//! Scenario loading from JSON files
//!
//! A scenario lists players with their kinematics, sensors (each on its own
//! gimbal-mounted antenna) and optional stand-alone gimbals. Transmitter
//! handles are assigned in file order starting at 1.

use crate::player::Player;
use crate::simulation::Simulation;
use crate::{Result, SimError};
use frame_math::Vec3;
use gimbal::{FlatTerrain, Gimbal, GimbalConfig, PlayerId, PlayerKind, PlayerState};
use rf_sensors::{Antenna, AntennaConfig, Radar, RadarConfig, Rwr, RwrConfig, Sensor, TransmitterId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};
use tracks::{RwrTrackManager, RwrTrackManagerConfig};

fn is_finite3(v: &[f64; 3]) -> bool {
    v.iter().all(|x| x.is_finite())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorConfig {
    Rwr {
        #[serde(default)]
        rwr: RwrConfig,
        #[serde(default)]
        antenna: AntennaConfig,
    },
    Radar {
        #[serde(default)]
        radar: RadarConfig,
        #[serde(default)]
        antenna: AntennaConfig,
    },
}

impl SensorConfig {
    fn build(&self, id: TransmitterId) -> Result<Sensor> {
        let (antenna, mut sensor) = match self {
            SensorConfig::Rwr { rwr, antenna } => (antenna, Sensor::Rwr(Rwr::from_config(id, rwr)?)),
            SensorConfig::Radar { radar, antenna } => {
                (antenna, Sensor::Radar(Radar::from_config(id, radar)?))
            }
        };
        let antenna = Antenna::from_config(antenna)?.into_shared();
        sensor.rf_mut().set_antenna(Some(antenna));
        Ok(sensor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub id: u32,
    pub name: String,
    pub kind: PlayerKind,
    /// NED (m)
    pub position: [f64; 3],
    /// NED (m/s)
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    /// (roll, pitch, yaw) in radians
    pub euler: [f64; 3],
    /// Radar cross section (m²)
    pub rcs: f64,
    pub local: bool,
    pub sensors: Vec<SensorConfig>,
    pub gimbals: Vec<GimbalConfig>,
    /// Track manager for the player's RWR reports. A player carrying an RWR
    /// without one gets the defaults.
    pub rwr_tracks: Option<RwrTrackManagerConfig>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            id: 0,
            name: "player".to_string(),
            kind: PlayerKind::Aircraft,
            position: [0.0; 3],
            velocity: [0.0; 3],
            acceleration: [0.0; 3],
            euler: [0.0; 3],
            rcs: 1.0,
            local: true,
            sensors: Vec::new(),
            gimbals: Vec::new(),
            rwr_tracks: None,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| {
            Err(SimError::InvalidScenario(format!(
                "player {} ({}): {what}",
                self.id, self.name
            )))
        };
        if !is_finite3(&self.position) || !is_finite3(&self.velocity) {
            return invalid("non-finite position or velocity");
        }
        if !is_finite3(&self.acceleration) || !is_finite3(&self.euler) {
            return invalid("non-finite acceleration or attitude");
        }
        if !(self.rcs >= 0.0) || !self.rcs.is_finite() {
            return invalid("rcs must be a finite value >= 0");
        }
        Ok(())
    }

    fn state(&self) -> PlayerState {
        let mut s = PlayerState::new(PlayerId(self.id), &self.name, self.kind);
        s.position = Vec3::from(self.position);
        s.velocity = Vec3::from(self.velocity);
        s.acceleration = Vec3::from(self.acceleration);
        s.euler = Vec3::from(self.euler);
        s.rcs = self.rcs;
        s.local = self.local;
        s
    }

    fn has_rwr(&self) -> bool {
        self.sensors
            .iter()
            .any(|s| matches!(s, SensorConfig::Rwr { .. }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    /// Frame period (s)
    pub dt: f64,
    /// Frames to run when the caller does not say
    pub frames: u64,
    /// Flat terrain elevation (m); no terrain occulting when absent
    pub terrain_elevation: Option<f64>,
    pub players: Vec<PlayerConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "scenario".to_string(),
            dt: 0.05,
            frames: 200,
            terrain_elevation: None,
            players: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SimError::InvalidTimeStep(self.dt));
        }
        if self.terrain_elevation.is_some_and(|e| !e.is_finite()) {
            return Err(SimError::InvalidScenario("non-finite terrain elevation".into()));
        }
        let mut ids = HashSet::new();
        for p in &self.players {
            if !ids.insert(p.id) {
                return Err(SimError::InvalidScenario(format!("duplicate player id {}", p.id)));
            }
            p.validate()?;
        }
        Ok(())
    }

    /// Instantiate every player, sensor and antenna
    pub fn build(&self) -> Result<Simulation> {
        self.validate()?;

        let mut sim = Simulation::new(&self.name);
        if let Some(elevation_m) = self.terrain_elevation {
            sim.set_terrain(Some(Box::new(FlatTerrain { elevation_m })));
        }

        let mut next_tx = 1u32;
        for pc in &self.players {
            let mut player = Player::new(pc.state());
            for sc in &pc.sensors {
                player.add_sensor(sc.build(TransmitterId(next_tx))?);
                next_tx += 1;
            }
            for gc in &pc.gimbals {
                player.add_gimbal(Gimbal::from_config(gc)?);
            }
            if pc.rwr_tracks.is_some() || pc.has_rwr() {
                let config = pc.rwr_tracks.clone().unwrap_or_default();
                player.set_track_manager(Some(Box::new(RwrTrackManager::new(config)?)));
            }
            debug!(
                player = %player.id(),
                name = %player.name(),
                sensors = player.sensors().len(),
                "player built"
            );
            sim.add_player(player)?;
        }

        info!(
            scenario = %self.name,
            players = sim.players().len(),
            transmitters = next_tx - 1,
            "scenario built"
        );
        Ok(sim)
    }
}

/// Load and validate a scenario file
pub fn load_scenario(path: impl AsRef<Path>) -> Result<ScenarioConfig> {
    let path = path.as_ref();
    info!("Loading scenario from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: ScenarioConfig = serde_json::from_reader(reader)?;
    config.validate()?;

    info!(
        scenario = %config.name,
        players = config.players.len(),
        dt = config.dt,
        "scenario loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_SHIPS: &str = r#"{
        "name": "two-ship",
        "dt": 0.1,
        "players": [
            {
                "id": 1,
                "name": "sam",
                "kind": "Ground",
                "sensors": [
                    { "type": "radar", "radar": { "rf": { "frequency": 9.0e9, "peak_power": 1.0e5 } } }
                ]
            },
            {
                "id": 2,
                "name": "strike",
                "position": [-20000.0, 0.0, -3000.0],
                "sensors": [ { "type": "rwr", "antenna": { "gain_db": 0.0, "beam_width": 0.0 } } ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let config: ScenarioConfig = serde_json::from_str(TWO_SHIPS).unwrap();
        assert_eq!(config.frames, 200);
        let sim = config.build().unwrap();
        assert_eq!(sim.players().len(), 2);

        let sam = sim.player(PlayerId(1)).unwrap();
        assert!(sam.track_manager().is_none());
        assert_eq!(sam.sensors()[0].rf().id(), TransmitterId(1));
        assert!(sam.sensors()[0].antenna().is_some());

        let strike = sim.player(PlayerId(2)).unwrap();
        assert!(strike.track_manager().is_some());
        assert_eq!(strike.sensors()[0].rf().id(), TransmitterId(2));
        assert_eq!(strike.state().altitude(), 3000.0);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let config = ScenarioConfig {
            players: vec![PlayerConfig::default(), PlayerConfig::default()],
            ..ScenarioConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidScenario(_))));
    }

    #[test]
    fn test_bad_values_rejected() {
        let config = ScenarioConfig {
            dt: 0.0,
            ..ScenarioConfig::default()
        };
        assert!(matches!(config.build(), Err(SimError::InvalidTimeStep(_))));

        let config = ScenarioConfig {
            players: vec![PlayerConfig {
                rcs: -1.0,
                ..PlayerConfig::default()
            }],
            ..ScenarioConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_rf_parameter_surfaces() {
        let json = r#"{ "players": [ { "id": 1,
            "sensors": [ { "type": "rwr", "rwr": { "rf": { "noise_figure": 0.5 } } } ] } ] }"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.build(), Err(SimError::Rf(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_SHIPS.as_bytes()).unwrap();
        let config = load_scenario(file.path()).unwrap();
        assert_eq!(config.name, "two-ship");
        assert_eq!(config.dt, 0.1);

        assert!(matches!(
            load_scenario(file.path().with_extension("missing")),
            Err(SimError::Io(_))
        ));
    }
}
