//! RF system bookkeeping
//!
//! Receiver noise floor, transmit power and the emission intake shared by
//! every RF sensor. Parameters are validated at the setter: a rejected value
//! leaves the system unchanged and the setter returns false.

use crate::antenna::SharedAntenna;
use crate::emission::{Emission, Polarization, TransmitterId};
use crate::intake::{EmissionIntake, PendingEmission};
use crate::{Result, RfError, MAX_EMISSIONS};
use frame_math::BOLTZMANN;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Typed RF configuration. Frequencies and bandwidths in Hz, power in W,
/// temperature in K, losses as linear factors ≥ 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RfParams {
    pub frequency: f64,
    pub bandwidth: f64,
    /// Noise bandwidth; the signal bandwidth when absent
    pub bandwidth_noise: Option<f64>,
    pub peak_power: f64,
    pub noise_figure: f64,
    pub system_temperature: f64,
    pub threshold_db: f64,
    pub loss_xmit: f64,
    pub loss_recv: f64,
    pub loss_signal_processing: f64,
    pub polarization: Polarization,
    pub transmitter_enabled: bool,
    pub receiver_enabled: bool,
}

impl Default for RfParams {
    fn default() -> Self {
        Self {
            frequency: 0.0,
            bandwidth: 1.0,
            bandwidth_noise: None,
            peak_power: 0.0,
            noise_figure: 1.0,
            system_temperature: 290.0,
            threshold_db: 0.0,
            loss_xmit: 1.0,
            loss_recv: 1.0,
            loss_signal_processing: 1.0,
            polarization: Polarization::None,
            transmitter_enabled: true,
            receiver_enabled: true,
        }
    }
}

#[derive(Debug)]
pub struct RfSystem {
    id: TransmitterId,
    name: String,

    frequency: f64,
    bandwidth: f64,
    bandwidth_noise: Option<f64>,
    peak_power: f64,
    noise_figure: f64,
    system_temperature: f64,
    threshold_db: f64,
    loss_xmit: f64,
    loss_recv: f64,
    loss_signal_processing: f64,
    polarization: Polarization,
    transmitter_enabled: bool,
    receiver_enabled: bool,

    rf_recv_noise: f64,
    antenna: Option<SharedAntenna>,
    intake: EmissionIntake,
}

impl RfSystem {
    /// Default parameters, no antenna
    pub fn new(id: TransmitterId, name: &str) -> Self {
        let p = RfParams::default();
        let mut rf = Self {
            id,
            name: name.to_string(),
            frequency: p.frequency,
            bandwidth: p.bandwidth,
            bandwidth_noise: p.bandwidth_noise,
            peak_power: p.peak_power,
            noise_figure: p.noise_figure,
            system_temperature: p.system_temperature,
            threshold_db: p.threshold_db,
            loss_xmit: p.loss_xmit,
            loss_recv: p.loss_recv,
            loss_signal_processing: p.loss_signal_processing,
            polarization: p.polarization,
            transmitter_enabled: p.transmitter_enabled,
            receiver_enabled: p.receiver_enabled,
            rf_recv_noise: 0.0,
            antenna: None,
            intake: EmissionIntake::new(MAX_EMISSIONS),
        };
        rf.compute_receiver_noise();
        rf
    }

    /// Build from configuration; the first rejected parameter is reported
    pub fn from_params(id: TransmitterId, name: &str, params: &RfParams) -> Result<Self> {
        let mut rf = Self::new(id, name);
        let invalid = |name: &'static str, value: f64| RfError::InvalidParameter { name, value };

        if !rf.set_frequency(params.frequency) {
            return Err(invalid("frequency", params.frequency));
        }
        if !rf.set_bandwidth(params.bandwidth) {
            return Err(invalid("bandwidth", params.bandwidth));
        }
        if let Some(bw) = params.bandwidth_noise {
            if !rf.set_bandwidth_noise(bw) {
                return Err(invalid("bandwidth_noise", bw));
            }
        }
        if !rf.set_peak_power(params.peak_power) {
            return Err(invalid("peak_power", params.peak_power));
        }
        if !rf.set_noise_figure(params.noise_figure) {
            return Err(invalid("noise_figure", params.noise_figure));
        }
        if !rf.set_system_temperature(params.system_temperature) {
            return Err(invalid("system_temperature", params.system_temperature));
        }
        if !rf.set_threshold_db(params.threshold_db) {
            return Err(invalid("threshold_db", params.threshold_db));
        }
        if !rf.set_loss_xmit(params.loss_xmit) {
            return Err(invalid("loss_xmit", params.loss_xmit));
        }
        if !rf.set_loss_recv(params.loss_recv) {
            return Err(invalid("loss_recv", params.loss_recv));
        }
        if !rf.set_loss_signal_processing(params.loss_signal_processing) {
            return Err(invalid("loss_signal_processing", params.loss_signal_processing));
        }
        rf.polarization = params.polarization;
        rf.transmitter_enabled = params.transmitter_enabled;
        rf.receiver_enabled = params.receiver_enabled;

        debug!(system = %rf.name, id = %rf.id, noise_w = rf.rf_recv_noise, "rf system configured");
        Ok(rf)
    }

    // ------------------------------------------------------------------------
    // Noise and power
    // ------------------------------------------------------------------------

    /// `N = F · k · T · B` with B the noise bandwidth
    pub fn compute_receiver_noise(&mut self) -> f64 {
        let b = self.bandwidth_noise.unwrap_or(self.bandwidth);
        self.rf_recv_noise = self.noise_figure * BOLTZMANN * self.system_temperature * b;
        self.rf_recv_noise
    }

    pub fn receiver_noise(&self) -> f64 {
        self.rf_recv_noise
    }

    /// Radiated power for a given peak power
    pub fn transmit_power(&self, peak_power: f64) -> f64 {
        peak_power / self.loss_xmit
    }

    /// In-band test: receiver on and `|f_em − f| ≤ bw/2`
    pub fn affects_rf_system(&self, em: &Emission) -> bool {
        self.receiver_enabled && (em.frequency() - self.frequency).abs() <= self.bandwidth / 2.0
    }

    /// Signal-to-noise in dB against `noise · extra_loss`; None for no signal
    pub fn signal_to_noise_db(&self, signal: f64, extra_loss: f64) -> Option<f64> {
        let floor = self.rf_recv_noise * extra_loss;
        (signal > 0.0 && floor > 0.0).then(|| 10.0 * (signal / floor).log10())
    }

    // ------------------------------------------------------------------------
    // Emission intake
    // ------------------------------------------------------------------------

    /// Hand a newly arrived emission to this receiver.
    ///
    /// Safe to call from any number of threads during the transmit phase. The
    /// emission is held until the next drain. Returns false when the receiver
    /// is off or the intake is full; the emission is then released here.
    pub fn rf_received_emission(&self, em: Arc<Emission>, rx_gain: f64) -> bool {
        if !self.receiver_enabled || !rx_gain.is_finite() || rx_gain < 0.0 {
            return false;
        }
        let signal = em.received_signal(rx_gain);
        trace!(system = %self.name, signal, "emission received");
        self.intake.push(signal, em)
    }

    /// Queue an emission whose received power was computed by the caller
    /// (W). Same backpressure as `rf_received_emission`.
    pub fn queue_signal(&self, signal: f64, em: Arc<Emission>) -> bool {
        if !self.receiver_enabled {
            return false;
        }
        self.intake.push(signal, em)
    }

    /// Take this frame's pending pairs (most recent first)
    pub fn drain_pending(&self) -> Vec<PendingEmission> {
        self.intake.drain()
    }

    /// Base receive: release everything pending
    pub fn receive(&mut self, _dt: f64) -> usize {
        self.drain_pending().len()
    }

    pub fn pending_count(&self) -> usize {
        self.intake.len()
    }

    pub fn dropped_emissions(&self) -> u64 {
        self.intake.dropped()
    }

    // ------------------------------------------------------------------------
    // Antenna
    // ------------------------------------------------------------------------

    /// Attach an antenna. `None` is rejected; use `shutdown_notification()`
    /// to detach.
    pub fn set_antenna(&mut self, antenna: Option<SharedAntenna>) -> bool {
        match antenna {
            Some(a) => {
                self.antenna = Some(a);
                true
            }
            None => false,
        }
    }

    pub fn antenna(&self) -> Option<&SharedAntenna> {
        self.antenna.as_ref()
    }

    /// Release the antenna and every pending emission
    pub fn shutdown_notification(&mut self) {
        let released = self.drain_pending().len();
        self.antenna = None;
        debug!(system = %self.name, released, "rf system shut down");
    }

    /// Discard pending emissions
    pub fn reset(&mut self) {
        self.drain_pending();
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    pub fn set_frequency(&mut self, hz: f64) -> bool {
        if !hz.is_finite() || hz < 0.0 {
            return false;
        }
        self.frequency = hz;
        true
    }

    /// Rejects bandwidths below 1 Hz
    pub fn set_bandwidth(&mut self, hz: f64) -> bool {
        if !hz.is_finite() || hz < 1.0 {
            return false;
        }
        self.bandwidth = hz;
        self.compute_receiver_noise();
        true
    }

    pub fn set_bandwidth_noise(&mut self, hz: f64) -> bool {
        if !hz.is_finite() || hz < 1.0 {
            return false;
        }
        self.bandwidth_noise = Some(hz);
        self.compute_receiver_noise();
        true
    }

    pub fn set_peak_power(&mut self, watts: f64) -> bool {
        if !watts.is_finite() || watts < 0.0 {
            return false;
        }
        self.peak_power = watts;
        true
    }

    pub fn set_noise_figure(&mut self, f: f64) -> bool {
        if !f.is_finite() || f < 1.0 {
            return false;
        }
        self.noise_figure = f;
        self.compute_receiver_noise();
        true
    }

    pub fn set_system_temperature(&mut self, kelvin: f64) -> bool {
        if !kelvin.is_finite() || kelvin <= 0.0 {
            return false;
        }
        self.system_temperature = kelvin;
        self.compute_receiver_noise();
        true
    }

    pub fn set_threshold_db(&mut self, db: f64) -> bool {
        if !db.is_finite() {
            return false;
        }
        self.threshold_db = db;
        true
    }

    pub fn set_loss_xmit(&mut self, loss: f64) -> bool {
        set_loss(&mut self.loss_xmit, loss)
    }

    pub fn set_loss_recv(&mut self, loss: f64) -> bool {
        set_loss(&mut self.loss_recv, loss)
    }

    pub fn set_loss_signal_processing(&mut self, loss: f64) -> bool {
        set_loss(&mut self.loss_signal_processing, loss)
    }

    pub fn set_polarization(&mut self, p: Polarization) {
        self.polarization = p;
    }

    pub fn set_transmitter_enabled(&mut self, on: bool) {
        self.transmitter_enabled = on;
    }

    pub fn set_receiver_enabled(&mut self, on: bool) {
        self.receiver_enabled = on;
    }

    // ------------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------------

    pub fn id(&self) -> TransmitterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn bandwidth_noise(&self) -> f64 {
        self.bandwidth_noise.unwrap_or(self.bandwidth)
    }

    pub fn peak_power(&self) -> f64 {
        self.peak_power
    }

    pub fn noise_figure(&self) -> f64 {
        self.noise_figure
    }

    pub fn system_temperature(&self) -> f64 {
        self.system_temperature
    }

    pub fn threshold_db(&self) -> f64 {
        self.threshold_db
    }

    pub fn loss_xmit(&self) -> f64 {
        self.loss_xmit
    }

    pub fn loss_recv(&self) -> f64 {
        self.loss_recv
    }

    pub fn loss_signal_processing(&self) -> f64 {
        self.loss_signal_processing
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    pub fn is_transmitter_enabled(&self) -> bool {
        self.transmitter_enabled
    }

    pub fn is_receiver_enabled(&self) -> bool {
        self.receiver_enabled
    }
}

fn set_loss(slot: &mut f64, loss: f64) -> bool {
    if !loss.is_finite() || loss < 1.0 {
        return false;
    }
    *slot = loss;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn rf() -> RfSystem {
        RfSystem::new(TransmitterId(1), "rx")
    }

    #[test]
    fn test_noise_floor_is_boltzmann() {
        let mut rf = rf();
        assert!(rf.set_noise_figure(1.0));
        assert!(rf.set_bandwidth(1.0));
        assert!(rf.set_system_temperature(1.0));
        assert_abs_diff_eq!(rf.compute_receiver_noise(), BOLTZMANN, epsilon = 1e-30);

        assert!(rf.set_system_temperature(290.0));
        assert_abs_diff_eq!(rf.receiver_noise(), 290.0 * BOLTZMANN, epsilon = 1e-30);
    }

    #[test]
    fn test_setters_recompute_noise() {
        let mut rf = rf();
        rf.set_bandwidth(1.0e6);
        let base = rf.receiver_noise();
        rf.set_noise_figure(2.0);
        assert_relative_eq!(rf.receiver_noise(), 2.0 * base);
        rf.set_bandwidth_noise(2.0e6);
        assert_relative_eq!(rf.receiver_noise(), 4.0 * base);
    }

    #[test]
    fn test_invalid_setters_rejected() {
        let mut rf = rf();
        let before = rf.receiver_noise();
        assert!(!rf.set_bandwidth(0.5));
        assert!(!rf.set_bandwidth(-10.0));
        assert!(!rf.set_noise_figure(0.0));
        assert!(!rf.set_system_temperature(0.0));
        assert!(!rf.set_loss_recv(0.9));
        assert!(!rf.set_frequency(f64::NAN));
        assert_eq!(rf.receiver_noise(), before);
        assert_eq!(rf.bandwidth(), 1.0);
    }

    #[test]
    fn test_from_params_reports_bad_field() {
        let params = RfParams {
            bandwidth: 0.0,
            ..RfParams::default()
        };
        assert_eq!(
            RfSystem::from_params(TransmitterId(2), "bad", &params).unwrap_err(),
            RfError::InvalidParameter {
                name: "bandwidth",
                value: 0.0
            }
        );
    }

    #[test]
    fn test_params_from_json() {
        let json = r#"{"frequency": 9.5e9, "bandwidth": 5e6, "noise_figure": 3.0, "loss_xmit": 2.0}"#;
        let params: RfParams = serde_json::from_str(json).unwrap();
        let rf = RfSystem::from_params(TransmitterId(3), "apg", &params).unwrap();
        assert_eq!(rf.frequency(), 9.5e9);
        assert_eq!(rf.system_temperature(), 290.0);
        assert_eq!(rf.transmit_power(1000.0), 500.0);
    }

    #[test]
    fn test_affects_rf_system_band_edges() {
        let mut rf = rf();
        rf.set_frequency(10.0e9);
        rf.set_bandwidth(2.0e9);
        let mut em = Emission::new();
        em.set_frequency(11.0e9);
        assert!(rf.affects_rf_system(&em));
        em.set_frequency(11.1e9);
        assert!(!rf.affects_rf_system(&em));
        em.set_frequency(10.0e9);
        rf.set_receiver_enabled(false);
        assert!(!rf.affects_rf_system(&em));
    }

    #[test]
    fn test_backpressure_drops_extra_emission() {
        let rf = rf();
        for _ in 0..MAX_EMISSIONS {
            assert!(rf.rf_received_emission(Arc::new(Emission::new()), 1.0));
        }
        let mut marker = Emission::new();
        marker.set_transmitter(Some(TransmitterId(77)));
        let marker = Arc::new(marker);
        assert!(!rf.rf_received_emission(Arc::clone(&marker), 1.0));

        assert_eq!(rf.pending_count(), MAX_EMISSIONS);
        assert_eq!(rf.dropped_emissions(), 1);
        assert_eq!(Arc::strong_count(&marker), 1);

        let batch = rf.drain_pending();
        assert_eq!(batch.len(), MAX_EMISSIONS);
        assert!(batch
            .iter()
            .all(|p| p.emission.transmitter() != Some(TransmitterId(77))));
        assert_eq!(rf.pending_count(), 0);
    }

    #[test]
    fn test_refcount_released_by_receive() {
        let mut rf = rf();
        let em = Arc::new(Emission::new());
        assert!(rf.rf_received_emission(Arc::clone(&em), 1.0));
        assert_eq!(Arc::strong_count(&em), 2);
        assert_eq!(rf.receive(0.05), 1);
        assert_eq!(Arc::strong_count(&em), 1);
    }

    #[test]
    fn test_disabled_receiver_refuses() {
        let mut rf = rf();
        rf.set_receiver_enabled(false);
        assert!(!rf.rf_received_emission(Arc::new(Emission::new()), 1.0));
        assert_eq!(rf.dropped_emissions(), 0);
    }

    #[test]
    fn test_set_antenna_none_rejected() {
        let mut rf = rf();
        assert!(!rf.set_antenna(None));
        assert!(rf.antenna().is_none());
    }
}
