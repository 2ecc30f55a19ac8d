//! Transmit → intake → RWR → report queue, across threads

use frame_math::Vec3;
use fuzz_harness::prelude::*;
use gimbal::{Gimbal, GimbalKind, PlayerId, PlayerKind, PlayerState};
use rayon::prelude::*;
use rf_sensors::{
    Antenna, Emission, Receiver, ReportSink, RfSystem, Rwr, TransmitterId, MAX_EMISSIONS,
};
use std::sync::Arc;

#[derive(Default)]
struct Reports(Vec<(Option<PlayerId>, f64)>);

impl ReportSink for Reports {
    fn new_report(&mut self, em: &Emission, sn_db: f64) {
        self.0.push((em.origin().map(|o| o.id), sn_db));
    }
}

fn player(id: u32, pos: [f64; 3]) -> PlayerState {
    let mut p = PlayerState::new(PlayerId(id), &format!("p{}", id), PlayerKind::Aircraft);
    p.position = Vec3::from(pos);
    p
}

fn rwr(id: u32) -> Rwr {
    let mut rf = RfSystem::new(TransmitterId(id), "rwr");
    rf.set_frequency(9.0e9);
    rf.set_bandwidth(4.0e9);
    rf.set_threshold_db(6.0);
    Rwr::new(rf)
}

fn template(tx: u32) -> Emission {
    let mut em = Emission::new();
    em.set_frequency(9.5e9);
    em.set_power(1.0e6);
    em.set_transmitter(Some(TransmitterId(tx)));
    em
}

#[test]
fn test_parallel_emitters_feed_one_rwr() {
    let victim = player(100, [0.0, 0.0, -5000.0]);
    let mut rwr = rwr(100);

    // eight emitters on a ring around the victim
    let emitters: Vec<(PlayerState, Antenna)> = (0..8)
        .map(|i| {
            let bearing = i as f64 * std::f64::consts::FRAC_PI_4;
            let p = player(
                i,
                [40_000.0 * bearing.cos(), 40_000.0 * bearing.sin(), -5000.0],
            );
            let antenna = Antenna::new(Gimbal::new("tx", GimbalKind::Electronic));
            antenna
                .gimbal()
                .process_players_of_interest(&p, &[victim.clone()], None);
            (p, antenna)
        })
        .collect();

    let delivered: usize = emitters
        .par_iter()
        .map(|(p, antenna)| {
            let receivers = [Receiver { player: &victim, system: rwr.rf() }];
            antenna
                .rf_transmit(&template(p.id().0), p, &receivers, None)
                .delivered
        })
        .sum();
    assert_eq!(delivered, 8);
    assert_eq!(rwr.rf().pending_count(), 8);

    let mut reports = Reports::default();
    assert_eq!(rwr.receive(0.05, Some(&mut reports)), 8);
    assert_eq!(reports.0.len(), 8);

    rwr.xfer_rays();
    let lit = rwr.rays().iter().filter(|r| **r > 0.0).count();
    assert_eq!(lit, 8);
    // emitter 2 sits due east of the victim
    assert!(rwr.rays()[90] > 0.0);

    assert_eq!(rwr.process(0.05), 8);
    assert!(rwr.report_queue().is_empty());
}

#[test]
fn test_overfilled_intake_drops_newest() {
    let rf = RfSystem::new(TransmitterId(1), "rx");
    (0..MAX_EMISSIONS + 500).into_par_iter().for_each(|i| {
        let mut em = Emission::new();
        em.set_transmitter(Some(TransmitterId(i as u32)));
        rf.queue_signal(1.0, Arc::new(em));
    });
    assert_eq!(rf.pending_count(), MAX_EMISSIONS);
    assert_eq!(rf.dropped_emissions(), 500);
    assert_eq!(rf.drain_pending().len(), MAX_EMISSIONS);
}

proptest! {
    #![proptest_config(FuzzConfig::new().cases(128).to_proptest_config())]

    #[test]
    fn test_rays_stay_normalized(
        signals in proptest::collection::vec(power_w(), 1..50),
        azimuths in proptest::collection::vec(azimuth_deg(), 50),
    ) {
        let mut rwr = rwr(1);
        for (s, az) in signals.iter().zip(azimuths.iter()) {
            let mut em = Emission::new();
            em.set_aoa(az.to_radians(), 0.0);
            rwr.rf().queue_signal(*s, Arc::new(em));
        }
        rwr.receive(0.05, None);
        rwr.xfer_rays();
        prop_assert!(rwr.rays().iter().all(|r| (0.0..=1.0).contains(r)));
        prop_assert_eq!(rwr.rf().pending_count(), 0);
    }
}
