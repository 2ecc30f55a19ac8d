//! Servo invariants under random commands

use frame_math::{angle_diff_rad, Vec3};
use fuzz_harness::prelude::*;
use gimbal::{Axis, Gimbal, GimbalKind, ServoMode};
use std::f64::consts::PI;

fn in_principal(v: &Vec3) -> bool {
    v.iter().all(|a| *a > -PI && *a <= PI)
}

fn within_limits(g: &Gimbal) -> bool {
    Axis::ALL.iter().all(|axis| {
        let (low, high) = g.limits(*axis);
        let a = g.position()[axis.index()];
        a >= low && a <= high
    })
}

proptest! {
    #![proptest_config(FuzzConfig::new().cases(256).to_proptest_config())]

    #[test]
    fn test_position_servo_stays_wrapped_and_limited(
        (pos, rate) in servo_command(),
        (low, high) in symmetric_limits(),
        rates in triple(max_rate()),
        dt in time_step(),
    ) {
        let mut g = Gimbal::new("prop", GimbalKind::Mechanical);
        g.set_limits(Axis::Elevation, low, high);
        g.set_max_rates(Vec3::from(rates));
        g.set_cmd_pos(Vec3::from(pos));

        for _ in 0..20 {
            let before = g.position();
            g.servo_controller(dt);
            let after = g.position();
            prop_assert!(in_principal(&after));
            prop_assert!(within_limits(&g));
            for i in 0..3 {
                let moved = angle_diff_rad(after[i], before[i]).abs();
                prop_assert!(moved <= rates[i] * dt + 1e-9);
            }
        }

        g.set_cmd_rate(Vec3::from(rate));
        g.servo_controller(dt);
        prop_assert!(in_principal(&g.position()));
        prop_assert!(within_limits(&g));
        for i in 0..3 {
            prop_assert!(g.rate()[i].abs() <= rates[i] + 1e-9);
        }
    }

    #[test]
    fn test_zero_dt_never_moves(
        (pos, rate) in servo_command(),
    ) {
        let mut g = Gimbal::new("prop", GimbalKind::Electronic);
        g.set_cmd_pos(Vec3::from(pos));
        g.servo_controller(0.0);
        prop_assert_eq!(g.position(), Vec3::zeros());
        g.set_cmd_rate(Vec3::from(rate));
        g.servo_controller(0.0);
        prop_assert_eq!(g.position(), Vec3::zeros());
        prop_assert_eq!(g.servo_mode(), ServoMode::Rate);
    }

    #[test]
    fn test_fast_slew_settles_in_one_frame(
        cmd in triple(principal_angle_rad()),
        dt in 1e-3f64..1.0,
    ) {
        let mut g = Gimbal::new("aesa", GimbalKind::Electronic);
        g.set_cmd_pos(Vec3::from(cmd));
        g.servo_controller(dt);
        prop_assert!(g.is_positioned());
    }
}

#[test]
fn test_servo_soak() {
    let mut runner = FuzzRunner::new(FuzzConfig::new().cases(200).seed(0x5e_2f0));
    let result = runner.run("servo_soak", |_, rng| {
        let kind = if rng.gen_bool(0.5) {
            GimbalKind::Mechanical
        } else {
            GimbalKind::Electronic
        };
        let mut g = Gimbal::new("soak", kind);
        let w = rng.gen_range(0.1..PI);
        g.set_limits(Axis::Azimuth, -w, w);
        g.set_max_rates(Vec3::repeat(rng.gen_range(0.0..2.0)));

        for frame in 0..500 {
            if frame % 50 == 0 {
                let cmd = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-2.0..2.0), 0.0);
                if rng.gen_ratio(1, 3) {
                    g.set_cmd_rate(cmd);
                } else {
                    g.set_cmd_pos(cmd);
                }
            }
            g.servo_controller(rng.gen_range(0.0..0.1));
            if !in_principal(&g.position()) {
                return Err(format!("frame {}: unwrapped {:?}", frame, g.position()));
            }
            if !within_limits(&g) {
                return Err(format!("frame {}: outside limits {:?}", frame, g.position()));
            }
        }
        Ok(())
    });
    assert!(result.passed, "{:?}", result.failures);
}
