//! Frame loop
//!
//! A frame runs the players through four phases in order. Only the transmit
//! phase fans out across threads: scans read shared antennas and push into
//! receiver intakes, which take their own locks.

use crate::player::Player;
use crate::{Result, SimError};
use gimbal::{PlayerId, PlayerState, Terrain};
use rayon::prelude::*;
use rf_sensors::{Receiver, Sensor, TransmitStats};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracks::RecorderSink;

/// Counters from one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub frame: u64,
    /// Simulation time at the end of the frame (s)
    pub time: f64,
    pub tdb_entries: usize,
    pub targets: usize,
    pub delivered: usize,
    pub echoes: usize,
    pub rejected: usize,
    pub reported: usize,
    pub detections: usize,
    pub tracks: usize,
    pub recorded: usize,
}

impl FrameStats {
    fn add_transmit(&mut self, tx: TransmitStats) {
        self.targets += tx.targets;
        self.delivered += tx.delivered;
        self.echoes += tx.echoes;
        self.rejected += tx.rejected;
    }
}

pub struct Simulation {
    name: String,
    players: Vec<Player>,
    terrain: Option<Box<dyn Terrain>>,
    recorder: Option<Box<dyn RecorderSink>>,
    frame: u64,
    time: f64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("name", &self.name)
            .field("players", &self.players)
            .field("frame", &self.frame)
            .field("time", &self.time)
            .finish()
    }
}

impl Simulation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            players: Vec::new(),
            terrain: None,
            recorder: None,
            frame: 0,
            time: 0.0,
        }
    }

    /// Add a player. Ids must be unique.
    pub fn add_player(&mut self, player: Player) -> Result<()> {
        if self.player(player.id()).is_some() {
            return Err(SimError::InvalidScenario(format!(
                "duplicate player id {}",
                player.id()
            )));
        }
        self.players.push(player);
        Ok(())
    }

    pub fn set_terrain(&mut self, terrain: Option<Box<dyn Terrain>>) {
        self.terrain = terrain;
    }

    pub fn set_recorder(&mut self, recorder: Option<Box<dyn RecorderSink>>) {
        self.recorder = recorder;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id() == id)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn recorded(&self) -> u64 {
        self.recorder.as_ref().map_or(0, |r| r.records())
    }

    /// Take a player out of play; false if unknown
    pub fn kill_player(&mut self, id: PlayerId) -> bool {
        match self.player_mut(id) {
            Some(p) => {
                p.kill();
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    /// Run one frame of `dt` seconds. A zero `dt` runs every phase without
    /// moving anything; receivers then discard what they were sent.
    pub fn step(&mut self, dt: f64) -> Result<FrameStats> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidTimeStep(dt));
        }
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        // 1. dynamics
        for p in &mut self.players {
            p.update_motion(dt);
        }
        let snapshot: Vec<PlayerState> = self.players.iter().map(|p| p.state().clone()).collect();
        let terrain = self.terrain.as_deref();
        for p in &mut self.players {
            stats.tdb_entries += p.update_gimbals(dt, &snapshot, terrain);
        }

        // 2. transmit
        stats.add_transmit(transmit_phase(&self.players));

        // 3. receive
        for p in &mut self.players {
            stats.reported += p.receive(dt);
            stats.detections += p.detections();
        }

        // 4. process
        for p in &mut self.players {
            p.process(dt);
            stats.tracks += p.track_count();
        }
        if let Some(recorder) = self.recorder.as_deref_mut() {
            for p in self.players.iter().filter(|p| p.is_alive()) {
                if let Some(tm) = p.track_manager() {
                    for track in tm.tracks() {
                        recorder.record_track(self.frame, p.id(), track)?;
                        stats.recorded += 1;
                    }
                }
            }
        }

        self.frame += 1;
        self.time += dt;
        stats.time = self.time;
        debug!(
            frame = stats.frame,
            targets = stats.targets,
            delivered = stats.delivered,
            reported = stats.reported,
            tracks = stats.tracks,
            "frame complete"
        );
        Ok(stats)
    }

    /// Run `frames` frames; returns the last frame's stats
    pub fn run(&mut self, frames: u64, dt: f64) -> Result<FrameStats> {
        let mut last = FrameStats::default();
        for _ in 0..frames {
            last = self.step(dt)?;
        }
        Ok(last)
    }

    /// Release every queued emission and flush the recorder
    pub fn shutdown(&mut self) -> Result<()> {
        for p in &mut self.players {
            p.shutdown();
        }
        if let Some(recorder) = self.recorder.as_deref_mut() {
            if let Err(e) = recorder.flush() {
                warn!(error = %e, "recorder flush failed");
                return Err(e.into());
            }
        }
        info!(
            simulation = %self.name,
            frames = self.frame,
            time = self.time,
            recorded = self.recorded(),
            "simulation shut down"
        );
        Ok(())
    }

    /// Rewind every player's sensors and gimbals; kinematics are kept
    pub fn reset(&mut self) {
        for p in &mut self.players {
            p.reset();
        }
        self.frame = 0;
        self.time = 0.0;
    }
}

/// Every live emitter scans its antenna's TDB into the live receivers
fn transmit_phase(players: &[Player]) -> TransmitStats {
    let live = || players.iter().filter(|p| p.is_alive());

    let receivers: Vec<Receiver<'_>> = live()
        .flat_map(|p| {
            p.sensors().iter().filter_map(move |s| {
                s.as_rwr().map(|rwr| Receiver {
                    player: p.state(),
                    system: rwr.rf(),
                })
            })
        })
        .collect();

    let emitters: Vec<(&PlayerState, &Sensor)> = live()
        .flat_map(|p| p.sensors().iter().map(move |s| (p.state(), s)))
        .collect();

    emitters
        .par_iter()
        .filter_map(|(ownship, sensor)| {
            let template = sensor.transmit()?;
            let antenna = sensor.antenna()?;
            let stats = antenna
                .read()
                .rf_transmit(&template, ownship, &receivers, Some(sensor.rf()));
            Some(stats)
        })
        .reduce(TransmitStats::default, |mut a, b| {
            a += b;
            a
        })
}
