//! Radar Warning Receiver
//!
//! Bins received emissions by angle of arrival into a 360-ray display buffer
//! and forwards detections to a track manager.
//!
//! Frame discipline:
//! 1. `receive(dt, sink)` clears the back rays, drains the intake and writes
//!    detections into the back rays and the report queue
//! 2. `xfer_rays()` publishes back → front exactly once per frame
//! 3. `process(dt)` releases the report queue
//!
//! Display code only ever reads the front rays.

use crate::emission::{Emission, TransmitterId};
use crate::rf_system::{RfParams, RfSystem};
use crate::{ReportSink, Result, MAX_EMISSIONS};
use frame_math::wrap_360;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

pub const NUM_RAYS: usize = 360;

/// S/N (dB) mapped to zero intensity; +50 dB maps to full
const INTENSITY_FLOOR_DB: f64 = -50.0;
const INTENSITY_SPAN_DB: f64 = 100.0;

// ============================================================================
// Ray buffer
// ============================================================================

/// Back (sensor) and front (display) ray arrays
#[derive(Debug, Clone)]
pub struct RayBuffer {
    back: [f64; NUM_RAYS],
    front: [f64; NUM_RAYS],
}

impl Default for RayBuffer {
    fn default() -> Self {
        Self {
            back: [0.0; NUM_RAYS],
            front: [0.0; NUM_RAYS],
        }
    }
}

impl RayBuffer {
    pub fn degrees_per_ray() -> f64 {
        360.0 / NUM_RAYS as f64
    }

    /// Ray bucket for an azimuth in degrees. An index past the end (359.5°
    /// and up rounding to 360, or a NaN) falls back to ray 0.
    pub fn ray_index(azimuth_deg: f64) -> usize {
        let idx = (wrap_360(azimuth_deg) / Self::degrees_per_ray()).round();
        if idx.is_finite() && idx >= 0.0 && (idx as usize) < NUM_RAYS {
            idx as usize
        } else {
            0
        }
    }

    pub fn clear_back(&mut self) {
        self.back = [0.0; NUM_RAYS];
    }

    /// Combine an intensity into a back ray (strongest wins)
    pub fn accumulate(&mut self, index: usize, intensity: f64) {
        if let Some(ray) = self.back.get_mut(index) {
            *ray = ray.max(intensity);
        }
    }

    /// Publish back → front
    pub fn xfer(&mut self) {
        self.front = self.back;
    }

    pub fn back(&self) -> &[f64; NUM_RAYS] {
        &self.back
    }

    pub fn front(&self) -> &[f64; NUM_RAYS] {
        &self.front
    }

    pub fn clear(&mut self) {
        self.back = [0.0; NUM_RAYS];
        self.front = [0.0; NUM_RAYS];
    }
}

// ============================================================================
// Report queue
// ============================================================================

/// Bounded FIFO of reported emissions awaiting `process()`
#[derive(Debug)]
pub struct ReportQueue {
    queue: VecDeque<Arc<Emission>>,
    capacity: usize,
}

impl ReportQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, em: Arc<Emission>) -> bool {
        if self.is_full() {
            return false;
        }
        self.queue.push_back(em);
        true
    }

    pub fn pop(&mut self) -> Option<Arc<Emission>> {
        self.queue.pop_front()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Release everything; returns how many were held
    pub fn clear(&mut self) -> usize {
        let n = self.queue.len();
        self.queue.clear();
        n
    }
}

// ============================================================================
// RWR
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RwrConfig {
    pub name: String,
    pub rf: RfParams,
    pub report_capacity: usize,
}

impl Default for RwrConfig {
    fn default() -> Self {
        Self {
            name: "rwr".to_string(),
            rf: RfParams::default(),
            report_capacity: MAX_EMISSIONS,
        }
    }
}

#[derive(Debug)]
pub struct Rwr {
    rf: RfSystem,
    rays: RayBuffer,
    reports: ReportQueue,
    alive: bool,
}

impl Rwr {
    pub fn new(rf: RfSystem) -> Self {
        Self {
            rf,
            rays: RayBuffer::default(),
            reports: ReportQueue::new(MAX_EMISSIONS),
            alive: true,
        }
    }

    pub fn from_config(id: TransmitterId, config: &RwrConfig) -> Result<Self> {
        let rf = RfSystem::from_params(id, &config.name, &config.rf)?;
        let mut rwr = Self::new(rf);
        rwr.reports = ReportQueue::new(config.report_capacity);
        Ok(rwr)
    }

    /// Consume this frame's pending emissions.
    ///
    /// Per pair: skipped when there is no signal or `dt` is zero. A pair whose
    /// S/N (against `noise · loss_recv`) beats the threshold, that is not ECM,
    /// and that fits in the report queue is reported to `sink`, lit on its
    /// arrival ray and queued. The pair's own reference is released either way.
    /// Returns the number reported.
    pub fn receive(&mut self, dt: f64, mut sink: Option<&mut dyn ReportSink>) -> usize {
        self.rays.clear_back();
        let batch = self.rf.drain_pending();
        let threshold = self.rf.threshold_db();
        let mut reported = 0;

        for pending in batch {
            if pending.signal <= 0.0 || dt == 0.0 || !self.alive {
                continue;
            }
            let Some(sn_db) = self.rf.signal_to_noise_db(pending.signal, self.rf.loss_recv()) else {
                continue;
            };
            if sn_db <= threshold || pending.emission.is_ecm() || self.reports.is_full() {
                continue;
            }

            if let Some(sink) = sink.as_mut() {
                sink.new_report(&pending.emission, sn_db);
            }

            let intensity = ((sn_db - INTENSITY_FLOOR_DB) / INTENSITY_SPAN_DB).clamp(0.0, 1.0);
            let ray = RayBuffer::ray_index(pending.emission.aoa_azimuth().to_degrees());
            self.rays.accumulate(ray, intensity);
            self.reports.push(pending.emission);
            reported += 1;
        }

        if reported > 0 {
            trace!(rwr = %self.rf.name(), reported, "rwr detections");
        }
        reported
    }

    /// Publish the back rays to the display side
    pub fn xfer_rays(&mut self) {
        self.rays.xfer();
    }

    /// Release the report queue; returns how many were released
    pub fn process(&mut self, _dt: f64) -> usize {
        let mut released = 0;
        while self.reports.pop().is_some() {
            released += 1;
        }
        released
    }

    /// Release every held emission, then stop reporting
    pub fn killed_notification(&mut self) {
        let queued = self.reports.clear();
        let pending = self.rf.drain_pending().len();
        self.alive = false;
        debug!(rwr = %self.rf.name(), queued, pending, "rwr killed");
    }

    pub fn shutdown_notification(&mut self) {
        self.reports.clear();
        self.rf.shutdown_notification();
    }

    pub fn reset(&mut self) {
        self.reports.clear();
        self.rays.clear();
        self.rf.reset();
        self.alive = true;
    }

    /// Display rays (front buffer)
    pub fn rays(&self) -> &[f64; NUM_RAYS] {
        self.rays.front()
    }

    pub fn ray_buffer(&self) -> &RayBuffer {
        &self.rays
    }

    pub fn report_queue(&self) -> &ReportQueue {
        &self.reports
    }

    pub fn is_alive(&self) -> bool {
        self.alive
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
    use approx::assert_relative_eq;

    struct Collector(Vec<(Option<TransmitterId>, f64)>);

    impl ReportSink for Collector {
        fn new_report(&mut self, em: &Emission, sn_db: f64) {
            self.0.push((em.transmitter(), sn_db));
        }
    }

    fn rwr() -> Rwr {
        let mut rf = RfSystem::new(TransmitterId(10), "rwr");
        rf.set_threshold_db(10.0);
        Rwr::new(rf)
    }

    fn emission(tx: u32, az_deg: f64) -> Arc<Emission> {
        let mut em = Emission::new();
        em.set_transmitter(Some(TransmitterId(tx)));
        em.set_aoa(az_deg.to_radians(), 0.0);
        Arc::new(em)
    }

    fn push(rwr: &Rwr, em: Arc<Emission>, sn_db: f64) {
        let signal = rwr.rf().receiver_noise() * 10f64.powf(sn_db / 10.0);
        assert!(rwr.rf().queue_signal(signal, em));
    }

    #[test]
    fn test_ray_index() {
        assert_eq!(RayBuffer::ray_index(0.0), 0);
        assert_eq!(RayBuffer::ray_index(90.4), 90);
        assert_eq!(RayBuffer::ray_index(-90.0), 270);
        assert_eq!(RayBuffer::ray_index(359.7), 0);
        assert_eq!(RayBuffer::ray_index(720.0 + 45.0), 45);
        assert_eq!(RayBuffer::ray_index(f64::NAN), 0);
    }

    #[test]
    fn test_double_buffer_isolation() {
        let mut rays = RayBuffer::default();
        rays.accumulate(10, 0.7);
        rays.accumulate(200, 0.2);
        assert!(rays.front().iter().all(|r| *r == 0.0));

        let snapshot = *rays.back();
        rays.xfer();
        assert_eq!(rays.front(), &snapshot);

        rays.clear_back();
        rays.accumulate(5, 1.0);
        assert_eq!(rays.front(), &snapshot);
    }

    #[test]
    fn test_receive_reports_and_lights_ray() {
        let mut rwr = rwr();
        push(&rwr, emission(1, 45.0), 30.0);
        push(&rwr, emission(2, 90.0), 5.0);

        let mut sink = Collector(Vec::new());
        let n = rwr.receive(0.05, Some(&mut sink));
        assert_eq!(n, 1);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].0, Some(TransmitterId(1)));
        assert_relative_eq!(sink.0[0].1, 30.0, epsilon = 1e-9);

        // (30 + 50) / 100
        assert_relative_eq!(rwr.ray_buffer().back()[45], 0.8, epsilon = 1e-9);
        assert_eq!(rwr.ray_buffer().back()[90], 0.0);
        assert!(rwr.rays().iter().all(|r| *r == 0.0));

        rwr.xfer_rays();
        assert_relative_eq!(rwr.rays()[45], 0.8, epsilon = 1e-9);
    }

    #[test]
    fn test_refcount_discipline() {
        let mut rwr = rwr();
        let reported = emission(1, 10.0);
        let ignored = emission(2, 20.0);
        push(&rwr, Arc::clone(&reported), 40.0);
        push(&rwr, Arc::clone(&ignored), 0.0);
        assert_eq!(Arc::strong_count(&reported), 2);
        assert_eq!(Arc::strong_count(&ignored), 2);

        rwr.receive(0.05, None);
        assert_eq!(Arc::strong_count(&ignored), 1);
        assert_eq!(Arc::strong_count(&reported), 2);
        assert_eq!(rwr.report_queue().len(), 1);

        assert_eq!(rwr.process(0.05), 1);
        assert_eq!(Arc::strong_count(&reported), 1);
    }

    #[test]
    fn test_zero_dt_and_ecm_skipped() {
        let mut rwr = rwr();
        push(&rwr, emission(1, 10.0), 40.0);
        assert_eq!(rwr.receive(0.0, None), 0);

        let mut jam = Emission::new();
        jam.set_ecm(true);
        push(&rwr, Arc::new(jam), 40.0);
        assert_eq!(rwr.receive(0.05, None), 0);
        assert!(rwr.report_queue().is_empty());
    }

    #[test]
    fn test_full_report_queue_discards() {
        let rf = RfSystem::new(TransmitterId(10), "rwr");
        let mut rwr = Rwr::new(rf);
        rwr.reports = ReportQueue::new(1);
        push(&rwr, emission(1, 10.0), 40.0);
        push(&rwr, emission(2, 20.0), 40.0);
        assert_eq!(rwr.receive(0.05, None), 1);
        assert_eq!(rwr.report_queue().len(), 1);
    }

    #[test]
    fn test_receive_clears_back_rays_each_frame() {
        let mut rwr = rwr();
        push(&rwr, emission(1, 45.0), 30.0);
        rwr.receive(0.05, None);
        rwr.xfer_rays();
        rwr.receive(0.05, None);
        assert!(rwr.ray_buffer().back().iter().all(|r| *r == 0.0));
        assert!(rwr.rays()[45] > 0.0);
    }

    #[test]
    fn test_killed_releases_everything() {
        let mut rwr = rwr();
        let queued = emission(1, 10.0);
        let pending = emission(2, 20.0);
        push(&rwr, Arc::clone(&queued), 40.0);
        rwr.receive(0.05, None);
        push(&rwr, Arc::clone(&pending), 40.0);

        rwr.killed_notification();
        assert_eq!(Arc::strong_count(&queued), 1);
        assert_eq!(Arc::strong_count(&pending), 1);
        assert!(!rwr.is_alive());
    }
}
