//! Concrete RF sensor kinds behind one type

use crate::antenna::SharedAntenna;
use crate::emission::Emission;
use crate::radar::Radar;
use crate::rf_system::RfSystem;
use crate::rwr::{Rwr, NUM_RAYS};
use crate::ReportSink;

#[derive(Debug)]
pub enum Sensor {
    Rwr(Rwr),
    Radar(Radar),
}

impl Sensor {
    pub fn rf(&self) -> &RfSystem {
        match self {
            Sensor::Rwr(s) => s.rf(),
            Sensor::Radar(s) => s.rf(),
        }
    }

    pub fn rf_mut(&mut self) -> &mut RfSystem {
        match self {
            Sensor::Rwr(s) => s.rf_mut(),
            Sensor::Radar(s) => s.rf_mut(),
        }
    }

    pub fn name(&self) -> &str {
        self.rf().name()
    }

    pub fn antenna(&self) -> Option<&SharedAntenna> {
        self.rf().antenna()
    }

    /// Template to radiate this frame; passive sensors never transmit
    pub fn transmit(&self) -> Option<Emission> {
        match self {
            Sensor::Rwr(_) => None,
            Sensor::Radar(s) => s.transmit(),
        }
    }

    /// Receive phase. Only an RWR reports to `sink`.
    pub fn receive(&mut self, dt: f64, sink: Option<&mut dyn ReportSink>) -> usize {
        match self {
            Sensor::Rwr(s) => s.receive(dt, sink),
            Sensor::Radar(s) => s.receive(dt),
        }
    }

    pub fn xfer_rays(&mut self) {
        if let Sensor::Rwr(s) = self {
            s.xfer_rays();
        }
    }

    pub fn process(&mut self, dt: f64) -> usize {
        match self {
            Sensor::Rwr(s) => s.process(dt),
            Sensor::Radar(_) => 0,
        }
    }

    /// Display rays, for sensors that have them
    pub fn rays(&self) -> Option<&[f64; NUM_RAYS]> {
        match self {
            Sensor::Rwr(s) => Some(s.rays()),
            Sensor::Radar(_) => None,
        }
    }

    pub fn killed_notification(&mut self) {
        match self {
            Sensor::Rwr(s) => s.killed_notification(),
            Sensor::Radar(s) => s.reset(),
        }
    }

    pub fn shutdown_notification(&mut self) {
        match self {
            Sensor::Rwr(s) => s.shutdown_notification(),
            Sensor::Radar(s) => s.shutdown_notification(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Sensor::Rwr(s) => s.reset(),
            Sensor::Radar(s) => s.reset(),
        }
    }

    pub fn as_rwr(&self) -> Option<&Rwr> {
        match self {
            Sensor::Rwr(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_radar(&self) -> Option<&Radar> {
        match self {
            Sensor::Radar(s) => Some(s),
            _ => None,
        }
    }
}
