//! Pulse radar
//!
//! Builds the emission template its antenna radiates each transmit phase and
//! turns its own skin echoes into detections on the receive phase.

use crate::emission::{Emission, TransmitterId};
use crate::rf_system::{RfParams, RfSystem};
use crate::Result;
use gimbal::PlayerId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub name: String,
    pub rf: RfParams,
    /// Seconds
    pub pulse_width: f64,
    /// Hz
    pub prf: f64,
    /// Pulses integrated per look
    pub pulses: u32,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            name: "radar".to_string(),
            rf: RfParams::default(),
            pulse_width: 1.0e-6,
            prf: 1000.0,
            pulses: 1,
        }
    }
}

/// One echo above threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub target: Option<PlayerId>,
    pub range: f64,
    pub range_rate: f64,
    /// Body-relative angles (rad)
    pub azimuth: f64,
    pub elevation: f64,
    pub sn_db: f64,
}

#[derive(Debug)]
pub struct Radar {
    rf: RfSystem,
    pulse_width: f64,
    prf: f64,
    pulses: u32,
    detections: Vec<Detection>,
    total_detections: u64,
}

impl Radar {
    pub fn new(rf: RfSystem) -> Self {
        let defaults = RadarConfig::default();
        Self {
            rf,
            pulse_width: defaults.pulse_width,
            prf: defaults.prf,
            pulses: defaults.pulses,
            detections: Vec::new(),
            total_detections: 0,
        }
    }

    pub fn from_config(id: TransmitterId, config: &RadarConfig) -> Result<Self> {
        let rf = RfSystem::from_params(id, &config.name, &config.rf)?;
        let mut radar = Self::new(rf);
        radar.pulse_width = config.pulse_width.max(0.0);
        radar.prf = config.prf.max(0.0);
        radar.pulses = config.pulses.max(1);
        Ok(radar)
    }

    /// Emission template for this frame, or None while the transmitter is off
    pub fn transmit(&self) -> Option<Emission> {
        if !self.rf.is_transmitter_enabled() {
            return None;
        }
        let mut em = Emission::new();
        em.set_frequency(self.rf.frequency());
        em.set_bandwidth(self.rf.bandwidth());
        em.set_pulse_width(self.pulse_width);
        em.set_prf(self.prf);
        em.set_pulses(self.pulses);
        em.set_power(self.rf.peak_power());
        em.set_transmit_loss(self.rf.loss_xmit());
        em.set_polarization(self.rf.polarization());
        em.set_transmitter(Some(self.rf.id()));
        trace!(
            radar = %self.rf.name(),
            radiated_w = self.rf.transmit_power(self.rf.peak_power()),
            "radar transmit"
        );
        Some(em)
    }

    /// Turn this frame's own echoes into detections. Pulses integrate
    /// coherently. Emissions from other transmitters are released unused.
    pub fn receive(&mut self, dt: f64) -> usize {
        self.detections.clear();
        let batch = self.rf.drain_pending();
        if dt == 0.0 {
            return 0;
        }
        let loss = self.rf.loss_recv() * self.rf.loss_signal_processing();

        for pending in batch {
            let em = &pending.emission;
            if em.transmitter() != Some(self.rf.id()) || em.rcs() <= 0.0 {
                continue;
            }
            let integrated = pending.signal * f64::from(em.pulses().max(1));
            let Some(sn_db) = self.rf.signal_to_noise_db(integrated, loss) else {
                continue;
            };
            if sn_db > self.rf.threshold_db() {
                self.detections.push(Detection {
                    target: em.target(),
                    range: em.range(),
                    range_rate: em.geometry().range_rate,
                    azimuth: em.aoa_azimuth(),
                    elevation: em.aoa_elevation(),
                    sn_db,
                });
            }
        }

        self.total_detections += self.detections.len() as u64;
        self.detections.len()
    }

    pub fn shutdown_notification(&mut self) {
        self.detections.clear();
        self.rf.shutdown_notification();
        debug!(radar = %self.rf.name(), total = self.total_detections, "radar shut down");
    }

    pub fn reset(&mut self) {
        self.detections.clear();
        self.total_detections = 0;
        self.rf.reset();
    }

    /// Detections from the most recent receive
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn total_detections(&self) -> u64 {
        self.total_detections
    }

    pub fn rf(&self) -> &RfSystem {
        &self.rf
    }

    pub fn rf_mut(&mut self) -> &mut RfSystem {
        &mut self.rf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn radar() -> Radar {
        let config = RadarConfig {
            rf: RfParams {
                frequency: 10.0e9,
                bandwidth: 1.0e6,
                peak_power: 5.0e3,
                loss_xmit: 2.0,
                threshold_db: 13.0,
                ..RfParams::default()
            },
            pulses: 4,
            ..RadarConfig::default()
        };
        Radar::from_config(TransmitterId(5), &config).unwrap()
    }

    fn echo(radar: &Radar, tx: TransmitterId, sn_db_per_pulse: f64) -> Arc<Emission> {
        let mut em = radar.transmit().unwrap();
        em.set_transmitter(Some(tx));
        em.set_rcs(1.0);
        em.set_target(Some(PlayerId(3)));
        let em = Arc::new(em);
        let signal = radar.rf().receiver_noise() * 10f64.powf(sn_db_per_pulse / 10.0);
        assert!(radar.rf().queue_signal(signal, Arc::clone(&em)));
        em
    }

    #[test]
    fn test_transmit_template() {
        let radar = radar();
        let em = radar.transmit().unwrap();
        assert_eq!(em.frequency(), 10.0e9);
        assert_eq!(em.pulses(), 4);
        assert_eq!(em.transmitter(), Some(TransmitterId(5)));
        assert_eq!(em.effective_radiated_power(), 2.5e3);
    }

    #[test]
    fn test_transmitter_off() {
        let mut radar = radar();
        radar.rf_mut().set_transmitter_enabled(false);
        assert!(radar.transmit().is_none());
    }

    #[test]
    fn test_integration_lifts_weak_echo() {
        let mut radar = radar();
        // 4 pulses: +6 dB, 10 dB per pulse clears a 13 dB threshold
        let em = echo(&radar, TransmitterId(5), 10.0);
        assert_eq!(radar.receive(0.05), 1);
        assert_eq!(radar.detections()[0].target, Some(PlayerId(3)));
        assert!((radar.detections()[0].sn_db - 16.0206).abs() < 1e-3);
        assert_eq!(Arc::strong_count(&em), 1);
    }

    #[test]
    fn test_foreign_echo_ignored() {
        let mut radar = radar();
        let em = echo(&radar, TransmitterId(99), 40.0);
        assert_eq!(radar.receive(0.05), 0);
        assert_eq!(Arc::strong_count(&em), 1);
        assert_eq!(radar.total_detections(), 0);
    }
}
