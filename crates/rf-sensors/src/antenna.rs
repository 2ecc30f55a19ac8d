//! Gimbal-mounted antenna
//!
//! The antenna owns the gimbal that points it (and through it the Target Data
//! Block of players in its beam). It is shared between the RF systems that
//! use it as `Arc<RwLock<Antenna>>`: written in the dynamics phase, read by
//! every transmit-phase scan.

use crate::emission::{Emission, Polarization};
use crate::rf_system::RfSystem;
use crate::Result;
use frame_math::{az_el_of, inverse_rotate_vector, Vec3, DEG2RAD};
use gimbal::{Gimbal, GimbalConfig, PlayerState, TdbEntry};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::sync::Arc;
use tracing::trace;

pub type SharedAntenna = Arc<RwLock<Antenna>>;

/// Loss factor between orthogonal polarizations
const CROSS_POLARIZATION_LOSS: f64 = 1.0e3;

/// Loss factor between a linear and a circular polarization (3 dB)
const MIXED_POLARIZATION_LOSS: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntennaConfig {
    pub gimbal: GimbalConfig,
    pub polarization: Polarization,
    /// Peak (boresight) gain (dBi)
    pub gain_db: f64,
    /// Full half-power beam width (rad); zero or less is isotropic
    pub beam_width: f64,
    /// Sidelobe floor (dBi)
    pub min_gain_db: f64,
}

impl Default for AntennaConfig {
    fn default() -> Self {
        Self {
            gimbal: GimbalConfig::default(),
            polarization: Polarization::None,
            gain_db: 30.0,
            beam_width: 3.5 * DEG2RAD,
            min_gain_db: -30.0,
        }
    }
}

/// A receiving system on another player, as seen by a transmit scan
#[derive(Debug, Clone, Copy)]
pub struct Receiver<'a> {
    pub player: &'a PlayerState,
    pub system: &'a RfSystem,
}

/// Counters from one `rf_transmit` scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitStats {
    /// TDB entries illuminated
    pub targets: usize,
    /// Emissions accepted by receivers
    pub delivered: usize,
    /// Skin echoes accepted by the transmitter
    pub echoes: usize,
    /// Emissions refused by a full or disabled receiver
    pub rejected: usize,
}

impl std::ops::AddAssign for TransmitStats {
    fn add_assign(&mut self, rhs: Self) {
        self.targets += rhs.targets;
        self.delivered += rhs.delivered;
        self.echoes += rhs.echoes;
        self.rejected += rhs.rejected;
    }
}

#[derive(Debug)]
pub struct Antenna {
    gimbal: Gimbal,
    polarization: Polarization,
    gain: f64,
    beam_width: f64,
    min_gain: f64,
}

fn from_db(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

impl Antenna {
    /// Isotropic, unpolarized antenna on the given gimbal
    pub fn new(gimbal: Gimbal) -> Self {
        Self {
            gimbal,
            polarization: Polarization::None,
            gain: 1.0,
            beam_width: 0.0,
            min_gain: 1.0,
        }
    }

    pub fn from_config(config: &AntennaConfig) -> Result<Self> {
        let gimbal = Gimbal::from_config(&config.gimbal)?;
        Ok(Self {
            gimbal,
            polarization: config.polarization,
            gain: from_db(config.gain_db),
            beam_width: config.beam_width,
            min_gain: from_db(config.min_gain_db),
        })
    }

    pub fn into_shared(self) -> SharedAntenna {
        Arc::new(RwLock::new(self))
    }

    pub fn gimbal(&self) -> &Gimbal {
        &self.gimbal
    }

    pub fn gimbal_mut(&mut self) -> &mut Gimbal {
        &mut self.gimbal
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    pub fn set_polarization(&mut self, p: Polarization) {
        self.polarization = p;
    }

    pub fn peak_gain(&self) -> f64 {
        self.gain
    }

    /// Gaussian main beam (half power at `beam_width / 2`) over a sidelobe floor
    pub fn gain_toward(&self, off_boresight: f64) -> f64 {
        if self.beam_width <= 0.0 {
            return self.gain;
        }
        let x = off_boresight / self.beam_width;
        (self.gain * (-4.0 * LN_2 * x * x).exp()).max(self.min_gain)
    }

    /// Gain toward a body-frame direction
    pub fn gain_toward_body(&self, dir_body: &Vec3) -> f64 {
        let los = inverse_rotate_vector(self.gimbal.matrix(), &dir_body.normalize());
        self.gain_toward(los.x.clamp(-1.0, 1.0).acos())
    }

    /// Radiate `template` at every player in this antenna's TDB.
    ///
    /// Each target gets its own emission (range, gain toward it, line of
    /// sight). Receivers on that target which are in band get a copy carrying
    /// their angle of arrival. When `echo_to` is set, targets with a cross
    /// section reflect a skin echo back into it.
    pub fn rf_transmit(
        &self,
        template: &Emission,
        ownship: &PlayerState,
        receivers: &[Receiver<'_>],
        echo_to: Option<&RfSystem>,
    ) -> TransmitStats {
        let tdb = self.gimbal.tdb();
        let mut stats = TransmitStats::default();

        for entry in tdb.entries() {
            stats.targets += 1;
            let em = self.emission_toward(template, ownship, entry);

            for rx in receivers.iter().filter(|r| r.player.id() == entry.target.id) {
                if !rx.system.affects_rf_system(&em) {
                    continue;
                }
                let (copy, rx_gain) = receive_geometry(&em, rx, &entry.los_world);
                if rx.system.rf_received_emission(Arc::new(copy), rx_gain) {
                    stats.delivered += 1;
                } else {
                    stats.rejected += 1;
                }
            }

            if let Some(tx) = echo_to {
                if entry.rcs > 0.0 && tx.affects_rf_system(&em) {
                    let mut echo = em.clone();
                    echo.set_rcs(entry.rcs);
                    let body = ownship.body_rotation().transpose() * entry.los_world;
                    let (az, el) = az_el_of(&body);
                    echo.set_aoa(az, el);
                    if tx.rf_received_emission(Arc::new(echo), em.gain()) {
                        stats.echoes += 1;
                    } else {
                        stats.rejected += 1;
                    }
                }
            }
        }

        trace!(
            targets = stats.targets,
            delivered = stats.delivered,
            echoes = stats.echoes,
            "rf transmit scan"
        );
        stats
    }

    fn emission_toward(&self, template: &Emission, ownship: &PlayerState, entry: &TdbEntry) -> Emission {
        let mut em = template.clone();
        em.set_range(entry.range);
        em.set_range_rate(entry.range_rate);
        em.set_los(entry.los_world);
        em.set_gain(self.gain_toward(entry.off_boresight));
        em.set_polarization(self.polarization);
        em.set_origin(Some(Arc::clone(&ownship.identity)));
        em.set_target(Some(entry.target.id));
        em
    }
}

/// Per-receiver copy with its angle of arrival, and the receive gain
fn receive_geometry(em: &Emission, rx: &Receiver<'_>, los_world: &Vec3) -> (Emission, f64) {
    let toward_emitter = rx.player.body_rotation().transpose() * (-los_world);
    let (az, el) = az_el_of(&toward_emitter);

    let rx_gain = match rx.system.antenna() {
        Some(antenna) => {
            let antenna = antenna.read();
            antenna.gain_toward_body(&toward_emitter)
                / polarization_loss(em.polarization(), antenna.polarization())
        }
        None => 1.0,
    };

    let mut copy = em.clone();
    copy.set_aoa(az, el);
    (copy, rx_gain)
}

/// Mismatch loss factor (≥ 1) between transmit and receive polarizations
pub fn polarization_loss(tx: Polarization, rx: Polarization) -> f64 {
    use Polarization as P;
    match (tx, rx) {
        (P::None, _) | (_, P::None) => 1.0,
        (a, b) if a == b => 1.0,
        (P::Vertical, P::Horizontal) | (P::Horizontal, P::Vertical) => CROSS_POLARIZATION_LOSS,
        (P::RightCircular, P::LeftCircular) | (P::LeftCircular, P::RightCircular) => {
            CROSS_POLARIZATION_LOSS
        }
        _ => MIXED_POLARIZATION_LOSS,
    }
}
