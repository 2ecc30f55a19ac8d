//! RF emission value object
//!
//! One simulated pulse (or CW look) travelling from a transmitter toward a
//! receiver. Emissions are built per target by the transmitting antenna and
//! shared as `Arc<Emission>`: the intake, the RWR report queue and anything
//! else holding one keep it alive; the last drop frees it.

use frame_math::{Vec3, SPEED_OF_LIGHT};
use gimbal::{PlayerId, TargetIdentity};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Range at or below which spreading loss is pinned to 1 (m)
pub const NEAR_FIELD_CUTOFF_M: f64 = 1.0;

/// Handle of the transmitting `RfSystem`. Never keeps the transmitter alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransmitterId(pub u32);

impl fmt::Display for TransmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TX{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarization {
    #[default]
    None,
    Vertical,
    Horizontal,
    Slant,
    RightCircular,
    LeftCircular,
}

impl Polarization {
    pub fn is_linear(self) -> bool {
        matches!(self, Self::Vertical | Self::Horizontal | Self::Slant)
    }

    pub fn is_circular(self) -> bool {
        matches!(self, Self::RightCircular | Self::LeftCircular)
    }
}

/// Range / angle-of-arrival record common to every detectable signal
#[derive(Debug, Clone, Default)]
pub struct SignalGeometry {
    /// Slant range transmitter → receiver (m)
    pub range: f64,
    /// Positive when opening (m/s)
    pub range_rate: f64,
    /// Angle of arrival relative to the receiver body (rad)
    pub aoa_azimuth: f64,
    pub aoa_elevation: f64,
    /// Unit line of sight transmitter → receiver, world NED
    pub los: Vec3,
    /// Player that radiated the emission
    pub origin: Option<Arc<TargetIdentity>>,
    /// Player the emission was aimed at
    pub target: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct Emission {
    freq: f64,
    lambda: f64,
    pw: f64,
    power: f64,
    polarization: Polarization,
    bw: f64,
    gain: f64,
    prf: f64,
    pulses: u32,
    rcs: f64,
    loss_rng: f64,
    loss_atmos: f64,
    loss_xmit: f64,
    ecm: bool,
    transmitter: Option<TransmitterId>,
    geometry: SignalGeometry,
}

impl Default for Emission {
    fn default() -> Self {
        Self {
            freq: 0.0,
            lambda: 0.0,
            pw: 0.0,
            power: 0.0,
            polarization: Polarization::None,
            bw: 0.0,
            gain: 1.0,
            prf: 0.0,
            pulses: 1,
            rcs: 0.0,
            loss_rng: 1.0,
            loss_atmos: 1.0,
            loss_xmit: 1.0,
            ecm: false,
            transmitter: None,
            geometry: SignalGeometry::default(),
        }
    }
}

fn non_negative(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

impl Emission {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // RF parameters
    // ------------------------------------------------------------------------

    /// Carrier frequency (Hz); also sets the wavelength
    pub fn set_frequency(&mut self, hz: f64) -> bool {
        if !non_negative(hz) {
            return false;
        }
        self.freq = hz;
        self.lambda = if hz > 0.0 { SPEED_OF_LIGHT / hz } else { 0.0 };
        true
    }

    pub fn set_pulse_width(&mut self, seconds: f64) -> bool {
        if !non_negative(seconds) {
            return false;
        }
        self.pw = seconds;
        true
    }

    /// Peak power at the transmitter (W)
    pub fn set_power(&mut self, watts: f64) -> bool {
        if !non_negative(watts) {
            return false;
        }
        self.power = watts;
        true
    }

    pub fn set_polarization(&mut self, p: Polarization) {
        self.polarization = p;
    }

    pub fn set_bandwidth(&mut self, hz: f64) -> bool {
        if !non_negative(hz) {
            return false;
        }
        self.bw = hz;
        true
    }

    /// Transmit antenna gain toward the receiver (linear)
    pub fn set_gain(&mut self, gain: f64) -> bool {
        if !non_negative(gain) {
            return false;
        }
        self.gain = gain;
        true
    }

    pub fn set_prf(&mut self, hz: f64) -> bool {
        if !non_negative(hz) {
            return false;
        }
        self.prf = hz;
        true
    }

    pub fn set_pulses(&mut self, n: u32) {
        self.pulses = n;
    }

    /// Reflecting cross section (m²). Zero for a one-way emission.
    pub fn set_rcs(&mut self, m2: f64) -> bool {
        if !non_negative(m2) {
            return false;
        }
        self.rcs = m2;
        true
    }

    pub fn set_atmos_loss(&mut self, loss: f64) -> bool {
        if !loss.is_finite() || loss < 1.0 {
            return false;
        }
        self.loss_atmos = loss;
        true
    }

    pub fn set_transmit_loss(&mut self, loss: f64) -> bool {
        if !loss.is_finite() || loss < 1.0 {
            return false;
        }
        self.loss_xmit = loss;
        true
    }

    pub fn set_ecm(&mut self, ecm: bool) {
        self.ecm = ecm;
    }

    pub fn set_transmitter(&mut self, tx: Option<TransmitterId>) {
        self.transmitter = tx;
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    /// Set the slant range and recompute spreading loss with the default
    /// near-field cutoff
    pub fn set_range(&mut self, r: f64) -> bool {
        self.set_range_with_cutoff(r, NEAR_FIELD_CUTOFF_M)
    }

    /// `loss_rng = 1/(4π r²)` beyond `cutoff`, 1 inside it
    pub fn set_range_with_cutoff(&mut self, r: f64, cutoff: f64) -> bool {
        if !non_negative(r) || !non_negative(cutoff) {
            return false;
        }
        self.geometry.range = r;
        self.loss_rng = if r > cutoff {
            1.0 / (4.0 * PI * r * r)
        } else {
            1.0
        };
        true
    }

    pub fn set_range_rate(&mut self, mps: f64) {
        self.geometry.range_rate = mps;
    }

    pub fn set_aoa(&mut self, azimuth: f64, elevation: f64) {
        self.geometry.aoa_azimuth = azimuth;
        self.geometry.aoa_elevation = elevation;
    }

    pub fn set_los(&mut self, los: Vec3) {
        self.geometry.los = los;
    }

    pub fn set_origin(&mut self, origin: Option<Arc<TargetIdentity>>) {
        self.geometry.origin = origin;
    }

    pub fn set_target(&mut self, target: Option<PlayerId>) {
        self.geometry.target = target;
    }

    /// Drop the transmitter handle and origin; reset propagation state
    pub fn clear(&mut self) {
        self.transmitter = None;
        self.geometry = SignalGeometry::default();
        self.loss_rng = 1.0;
        self.loss_atmos = 1.0;
        self.ecm = false;
    }

    // ------------------------------------------------------------------------
    // Derived
    // ------------------------------------------------------------------------

    /// `power · gain / loss_xmit` (W)
    pub fn effective_radiated_power(&self) -> f64 {
        self.power * self.gain / self.loss_xmit
    }

    /// Power delivered to a receive antenna of linear gain `rx_gain` (W).
    ///
    /// One-way: `ERP · loss_rng / loss_atmos · rx_gain·λ²/4π`.
    /// With a cross section set the spreading loss and the cross section
    /// apply again for the return leg.
    pub fn received_signal(&self, rx_gain: f64) -> f64 {
        let mut density = self.effective_radiated_power() * self.loss_rng / self.loss_atmos;
        if self.rcs > 0.0 {
            density *= self.rcs * self.loss_rng;
        }
        let aperture = rx_gain * self.lambda * self.lambda / (4.0 * PI);
        density * aperture
    }

    pub fn frequency(&self) -> f64 {
        self.freq
    }

    pub fn wavelength(&self) -> f64 {
        self.lambda
    }

    pub fn pulse_width(&self) -> f64 {
        self.pw
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    pub fn bandwidth(&self) -> f64 {
        self.bw
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn prf(&self) -> f64 {
        self.prf
    }

    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    pub fn rcs(&self) -> f64 {
        self.rcs
    }

    pub fn range_loss(&self) -> f64 {
        self.loss_rng
    }

    pub fn atmos_loss(&self) -> f64 {
        self.loss_atmos
    }

    pub fn transmit_loss(&self) -> f64 {
        self.loss_xmit
    }

    pub fn is_ecm(&self) -> bool {
        self.ecm
    }

    pub fn transmitter(&self) -> Option<TransmitterId> {
        self.transmitter
    }

    pub fn geometry(&self) -> &SignalGeometry {
        &self.geometry
    }

    pub fn range(&self) -> f64 {
        self.geometry.range
    }

    pub fn aoa_azimuth(&self) -> f64 {
        self.geometry.aoa_azimuth
    }

    pub fn aoa_elevation(&self) -> f64 {
        self.geometry.aoa_elevation
    }

    pub fn origin(&self) -> Option<&Arc<TargetIdentity>> {
        self.geometry.origin.as_ref()
    }

    pub fn target(&self) -> Option<PlayerId> {
        self.geometry.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gimbal::PlayerKind;

    #[test]
    fn test_frequency_sets_wavelength() {
        let mut em = Emission::new();
        assert!(em.set_frequency(10.0e9));
        assert_relative_eq!(em.wavelength(), 0.029_979_245_8, max_relative = 1e-9);
        assert!(!em.set_frequency(-1.0));
        assert!(em.set_frequency(0.0));
        assert_eq!(em.wavelength(), 0.0);
    }

    #[test]
    fn test_range_loss_near_field_cutoff() {
        let mut em = Emission::new();
        em.set_range(1.0);
        assert_eq!(em.range_loss(), 1.0);
        em.set_range(0.0);
        assert_eq!(em.range_loss(), 1.0);
        em.set_range(1000.0);
        assert_relative_eq!(em.range_loss(), 1.0 / (4.0 * PI * 1.0e6));

        em.set_range_with_cutoff(5.0, 10.0);
        assert_eq!(em.range_loss(), 1.0);
        assert_eq!(em.range(), 5.0);
    }

    #[test]
    fn test_clear_releases_transmitter_and_origin() {
        let identity = Arc::new(TargetIdentity {
            id: PlayerId(4),
            name: "sam".to_string(),
            kind: PlayerKind::Ground,
        });
        let mut em = Emission::new();
        em.set_transmitter(Some(TransmitterId(9)));
        em.set_origin(Some(Arc::clone(&identity)));
        em.set_range(2000.0);
        assert_eq!(Arc::strong_count(&identity), 2);

        em.clear();
        assert_eq!(em.transmitter(), None);
        assert!(em.origin().is_none());
        assert_eq!(em.range_loss(), 1.0);
        assert_eq!(Arc::strong_count(&identity), 1);
    }

    #[test]
    fn test_two_way_signal_is_radar_equation() {
        let mut em = Emission::new();
        em.set_frequency(3.0e9);
        em.set_power(1.0e6);
        em.set_gain(1000.0);
        em.set_range(10_000.0);
        em.set_rcs(5.0);

        let lambda = em.wavelength();
        let expected = 1.0e6 * 1000.0 * 1000.0 * lambda * lambda * 5.0
            / ((4.0 * PI).powi(3) * 10_000f64.powi(4));
        assert_relative_eq!(em.received_signal(1000.0), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_erp_includes_transmit_loss() {
        let mut em = Emission::new();
        em.set_power(100.0);
        em.set_gain(10.0);
        assert!(em.set_transmit_loss(2.0));
        assert!(!em.set_transmit_loss(0.5));
        assert_eq!(em.effective_radiated_power(), 500.0);
    }
}
