//! Angle-only track manager for radar warning receivers
//!
//! Reports are copied out of the emission during the receive phase (the
//! emission itself is never kept) and folded into tracks on `process`.
//! Correlation is by transmitter handle first, then by the nearest track
//! inside the azimuth gate.

use crate::track::{Track, TrackKind};
use crate::{Result, TrackError, TrackManager};
use frame_math::{angle_diff_rad, wrap_rad, DEG2RAD};
use gimbal::{PlayerKind, PlayerState, TargetIdentity};
use rf_sensors::{Emission, ReportSink, TransmitterId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RwrTrackManagerConfig {
    pub max_tracks: usize,
    /// Tracks not updated for this long are dropped (s)
    pub max_track_age: f64,
    /// Half-width of the bearing correlation gate (rad)
    pub azimuth_gate: f64,
    /// Bearing smoothing gain in (0, 1]
    pub alpha: f64,
}

impl Default for RwrTrackManagerConfig {
    fn default() -> Self {
        Self {
            max_tracks: 50,
            max_track_age: 2.0,
            azimuth_gate: 5.0 * DEG2RAD,
            alpha: 0.5,
        }
    }
}

impl RwrTrackManagerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_tracks == 0 {
            return Err(TrackError::InvalidConfig("max_tracks must be > 0".into()));
        }
        if !(self.max_track_age > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "max_track_age must be > 0, got {}",
                self.max_track_age
            )));
        }
        if !(self.azimuth_gate > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "azimuth_gate must be > 0, got {}",
                self.azimuth_gate
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(TrackError::InvalidConfig(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// What a track manager keeps from one RWR report
#[derive(Debug, Clone)]
struct RwrReport {
    emitter: Option<TransmitterId>,
    origin: Option<Arc<TargetIdentity>>,
    aoa_azimuth: f64,
    aoa_elevation: f64,
    sn_db: f64,
    frequency: f64,
}

#[derive(Debug)]
pub struct RwrTrackManager {
    config: RwrTrackManagerConfig,
    tracks: Vec<Track>,
    reports: Vec<RwrReport>,
    next_id: u32,
}

impl Default for RwrTrackManager {
    fn default() -> Self {
        Self {
            config: RwrTrackManagerConfig::default(),
            tracks: Vec::new(),
            reports: Vec::new(),
            next_id: 1,
        }
    }
}

impl RwrTrackManager {
    pub fn new(config: RwrTrackManagerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &RwrTrackManagerConfig {
        &self.config
    }

    pub fn pending_reports(&self) -> usize {
        self.reports.len()
    }

    fn correlate(&self, report: &RwrReport, true_az: f64) -> Option<usize> {
        if let Some(tx) = report.emitter {
            if let Some(i) = self.tracks.iter().position(|t| t.emitter() == Some(tx)) {
                return Some(i);
            }
        }
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.emitter().is_none() || report.emitter.is_none())
            .map(|(i, t)| (i, angle_diff_rad(t.true_azimuth(), true_az).abs()))
            .filter(|(_, d)| *d <= self.config.azimuth_gate)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn new_track(&mut self, report: &RwrReport) -> Option<usize> {
        if self.tracks.len() >= self.config.max_tracks {
            return None;
        }
        let kind = match report.origin.as_ref().map(|o| o.kind) {
            Some(PlayerKind::Aircraft) | Some(PlayerKind::Weapon) => TrackKind::RWR | TrackKind::AIR,
            Some(_) => TrackKind::RWR | TrackKind::GND,
            None => TrackKind::RWR,
        };
        let mut track = Track::new(self.next_id, kind);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        track.set_emitter(report.emitter);
        track.set_quality(self.config.alpha);
        self.tracks.push(track);
        Some(self.tracks.len() - 1)
    }
}

impl ReportSink for RwrTrackManager {
    fn new_report(&mut self, em: &Emission, sn_db: f64) {
        self.reports.push(RwrReport {
            emitter: em.transmitter(),
            origin: em.origin().cloned(),
            aoa_azimuth: em.aoa_azimuth(),
            aoa_elevation: em.aoa_elevation(),
            sn_db,
            frequency: em.frequency(),
        });
    }
}

impl TrackManager for RwrTrackManager {
    fn process(&mut self, dt: f64, ownship: &PlayerState) {
        let heading = ownship.heading();
        let decay = if dt > 0.0 { dt / self.config.max_track_age } else { 0.0 };

        for track in &mut self.tracks {
            track.update_age(dt.max(0.0));
            track.set_quality(track.quality() - decay);
            track.set_ownship_dynamics(heading, ownship.velocity);
        }

        let reports = std::mem::take(&mut self.reports);
        let mut created = 0;
        for report in &reports {
            let true_az = wrap_rad(heading + report.aoa_azimuth);
            let (i, fresh) = match self.correlate(report, true_az) {
                Some(i) => (i, false),
                None => match self.new_track(report) {
                    Some(i) => {
                        created += 1;
                        (i, true)
                    }
                    None => {
                        trace!(max = self.config.max_tracks, "rwr track table full");
                        continue;
                    }
                },
            };

            let alpha = self.config.alpha;
            let track = &mut self.tracks[i];
            let az = if fresh {
                true_az
            } else {
                track.true_azimuth() + alpha * angle_diff_rad(true_az, track.true_azimuth())
            };
            track.set_bearing(az, report.aoa_elevation);
            track.reset_age();
            track.set_quality(track.quality() + alpha * (1.0 - track.quality()));
            track.set_signal_db(report.sn_db);
            track.set_frequency(report.frequency);
            if report.emitter.is_some() {
                track.set_emitter(report.emitter);
            }
            if report.origin.is_some() {
                track.set_target(report.origin.clone());
            }
        }

        let before = self.tracks.len();
        let max_age = self.config.max_track_age;
        self.tracks.retain(|t| t.age() <= max_age);
        let dropped = before - self.tracks.len();

        if created > 0 || dropped > 0 {
            debug!(
                tracks = self.tracks.len(),
                created,
                dropped,
                "rwr tracks updated"
            );
        }
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn clear(&mut self) {
        self.tracks.clear();
        self.reports.clear();
    }

    fn as_report_sink(&mut self) -> &mut dyn ReportSink {
        self
    }
}
