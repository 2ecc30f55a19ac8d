//! Track recorder sinks
//!
//! One JSON object per line, stamped with wall-clock UTC. The layout follows
//! `TrackRecord` and is not a stable interchange format.

use crate::track::{Track, TrackRecord};
use crate::Result;
use chrono::{DateTime, Utc};
use gimbal::PlayerId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub trait RecorderSink: Send {
    fn record_track(&mut self, frame: u64, ownship: PlayerId, track: &Track) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Records written so far
    fn records(&self) -> u64;
}

/// One recorded line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackLine {
    pub timestamp: DateTime<Utc>,
    pub frame: u64,
    pub ownship: PlayerId,
    #[serde(flatten)]
    pub track: TrackRecord,
}

pub struct JsonLinesRecorder<W: Write + Send> {
    out: W,
    records: u64,
}

impl<W: Write + Send> JsonLinesRecorder<W> {
    pub fn new(out: W) -> Self {
        Self { out, records: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesRecorder<BufWriter<File>> {
    /// Create (or truncate) a recording file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        info!(path = %path.display(), "recording tracks");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> RecorderSink for JsonLinesRecorder<W> {
    fn record_track(&mut self, frame: u64, ownship: PlayerId, track: &Track) -> Result<()> {
        let line = TrackLine {
            timestamp: Utc::now(),
            frame,
            ownship,
            track: track.snapshot(),
        };
        serde_json::to_writer(&mut self.out, &line)?;
        self.out.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn records(&self) -> u64 {
        self.records
    }
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullRecorder {
    records: u64,
}

impl RecorderSink for NullRecorder {
    fn record_track(&mut self, _frame: u64, _ownship: PlayerId, _track: &Track) -> Result<()> {
        self.records += 1;
        Ok(())
    }

    fn records(&self) -> u64 {
        self.records
    }
}
