//! Tracks Library
//!
//! Correlated-target state kept by track managers:
//! - `Track` kinematics in local NED plus derived range / bearing / aspect
//! - `RwrTrackManager` correlating RWR reports into angle-only tracks
//! - Recorder sinks writing track snapshots as JSON lines

use thiserror::Error;

pub mod recorder;
pub mod rwr_track_manager;
pub mod track;

pub use recorder::{JsonLinesRecorder, NullRecorder, RecorderSink, TrackLine};
pub use rwr_track_manager::{RwrTrackManager, RwrTrackManagerConfig};
pub use track::{Track, TrackKind, TrackRecord};

use gimbal::PlayerState;
use rf_sensors::ReportSink;

/// Owns a set of tracks fed by sensor reports
pub trait TrackManager: ReportSink + Send {
    /// Fold this frame's reports into the track list and age it
    fn process(&mut self, dt: f64, ownship: &PlayerState);
    fn tracks(&self) -> &[Track];
    fn clear(&mut self);
    /// The report side of this manager, handed to sensors while receiving
    fn as_report_sink(&mut self) -> &mut dyn ReportSink;
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Invalid track manager config: {0}")]
    InvalidConfig(String),
    #[error("Recorder I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Recorder encoding: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackError>;
