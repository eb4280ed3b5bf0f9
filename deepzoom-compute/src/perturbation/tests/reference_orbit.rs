use super::helpers::orbit_at;
use crate::{ReferenceOrbit, ORBIT_ESCAPE_RADIUS_SQ};
use deepzoom_core::{BigFloat, Frame};

#[test]
fn reference_orbit_in_set_never_escapes() {
    // Point (-0.5, 0) is in the main cardioid
    let orbit = orbit_at(-0.5, 0.0, 1000);

    assert_eq!(orbit.escaped_at, None);
    assert_eq!(orbit.len(), 1000);
    assert!((orbit.c_ref.0 - (-0.5)).abs() < 1e-10);
    assert!(orbit.c_ref.1.abs() < 1e-10);
}

#[test]
fn reference_orbit_outside_set_truncates() {
    // c = 2: 0, 2, 6, 38, 1446. |1446|² is the first value past 256².
    let orbit = orbit_at(2.0, 0.0, 1000);

    assert_eq!(orbit.escaped_at, Some(4));
    assert_eq!(
        orbit.orbit,
        vec![(0.0, 0.0), (2.0, 0.0), (6.0, 0.0), (38.0, 0.0), (1446.0, 0.0)]
    );
}

#[test]
fn reference_orbit_values_bounded_until_last() {
    let orbit = orbit_at(-0.75, 0.1, 1000);
    assert!(orbit.escaped_at.is_some());

    let (last, rest) = orbit.orbit.split_last().unwrap();
    for (x, y) in rest {
        let mag_sq = x * x + y * y;
        assert!(mag_sq <= ORBIT_ESCAPE_RADIUS_SQ, "Orbit value escaped early: ({}, {})", x, y);
    }
    assert!(last.0 * last.0 + last.1 * last.1 > ORBIT_ESCAPE_RADIUS_SQ);
}

#[test]
fn orbit_satisfies_recurrence_relation() {
    // z_{n+1} = z_n^2 + c, checked in f64 against the stored points
    let orbit = orbit_at(-0.5, 0.1, 100);
    let (c_x, c_y) = orbit.c_ref;

    for n in 0..orbit.len() - 1 {
        let (xn, yn) = orbit.orbit[n];
        let (xn1, yn1) = orbit.orbit[n + 1];

        let expected_x = xn * xn - yn * yn + c_x;
        let expected_y = 2.0 * xn * yn + c_y;

        assert!(
            (xn1 - expected_x).abs() < 1e-10,
            "x recurrence failed at n={}: got {}, expected {}",
            n,
            xn1,
            expected_x
        );
        assert!(
            (yn1 - expected_y).abs() < 1e-10,
            "y recurrence failed at n={}: got {}, expected {}",
            n,
            yn1,
            expected_y
        );
    }
}

#[test]
fn imaginary_part_uses_previous_real_part() {
    // c = i: 0, i, -1 + i, -i, -1 + i
    let orbit = orbit_at(0.0, 1.0, 5);
    assert_eq!(
        orbit.orbit,
        vec![(0.0, 0.0), (0.0, 1.0), (-1.0, 1.0), (0.0, -1.0), (-1.0, 1.0)]
    );
}

#[test]
fn period_two_point_alternates() {
    let orbit = orbit_at(-1.0, 0.0, 9);
    for (n, &(re, im)) in orbit.orbit.iter().enumerate() {
        let expected = if n % 2 == 0 { 0.0 } else { -1.0 };
        assert_eq!((re, im), (expected, 0.0), "z_{}", n);
    }
}

#[test]
fn orbit_starts_at_origin_and_respects_cap() {
    for cap in [0, 1, 2, 17, 300] {
        let orbit = orbit_at(-0.1, 0.65, cap);
        assert_eq!(orbit.orbit[0], (0.0, 0.0));
        assert!(orbit.len() <= (cap as usize).max(1), "cap {} gave {}", cap, orbit.len());
    }
}

#[test]
fn zero_cap_gives_single_point() {
    let orbit = orbit_at(2.0, 0.0, 0);
    assert_eq!(orbit.orbit, vec![(0.0, 0.0)]);
    assert_eq!(orbit.escaped_at, None);
}

#[test]
fn build_uses_frame_center() {
    let frame = Frame::from_f64(-0.5, 0.25, 1e6, 128);
    let built = ReferenceOrbit::build(&frame, 200).unwrap();
    let computed = ReferenceOrbit::compute(
        &(
            BigFloat::with_precision(-0.5, 128),
            BigFloat::with_precision(0.25, 128),
        ),
        200,
    )
    .unwrap();
    assert_eq!(built.orbit, computed.orbit);
    assert_eq!(built.c_ref, (-0.5, 0.25));
}

#[test]
fn build_iterates_at_frame_precision_not_center_precision() {
    // 64-bit center with a 512-bit zoom: the frame, not the center, sets the
    // working precision of the orbit.
    let frame = Frame::with_bigfloat(
        BigFloat::with_precision(-1.99999911758738, 64),
        BigFloat::zero(64),
        BigFloat::with_precision(1e12, 512),
    );
    assert_eq!(frame.precision_bits(), 512);

    let built = ReferenceOrbit::build(&frame, 300).unwrap();
    let wide = ReferenceOrbit::compute(
        &(
            BigFloat::with_precision(-1.99999911758738, 512),
            BigFloat::zero(512),
        ),
        300,
    )
    .unwrap();
    assert_eq!(built.orbit, wide.orbit);
    assert_eq!(built.escaped_at, wide.escaped_at);
}

#[test]
fn high_precision_center_is_preserved() {
    // The offset is far below f64 resolution around -1.4
    let frame = Frame::from_strings("-1.4000000000000000000000001", "0", "1e20", 256).unwrap();
    let orbit = ReferenceOrbit::build(&frame, 50).unwrap();
    assert_eq!(orbit.len(), 50);
    assert!((orbit.c_ref.0 - (-1.4)).abs() < 1e-15);
}
