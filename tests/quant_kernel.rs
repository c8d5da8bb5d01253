use mnist_edge::{argmax_i8, dequantize, quantize};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[test]
fn quantize_stays_in_i8_for_random_inputs() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..20_000 {
        let x: f32 = rng.gen_range(-1e6..1e6);
        let s: f32 = rng.gen_range(1e-6..10.0);
        let z: i32 = rng.gen_range(-128..=127);
        let q = quantize(x, s, z) as i32;
        assert!((-128..=127).contains(&q), "x={} s={} z={} -> {}", x, s, z, q);
    }
}

#[test]
fn roundtrip_error_bounded_by_scale_inside_range() {
    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..20_000 {
        let s: f32 = rng.gen_range(1e-3..1.0);
        let z: i32 = rng.gen_range(-128..=127);
        // stay inside the representable range so saturation does not apply
        let lo = (-128 - z) as f32 * s;
        let hi = (127 - z) as f32 * s;
        let x: f32 = rng.gen_range(lo..=hi);
        let back = dequantize(quantize(x, s, z), s, z);
        assert!((back - x).abs() <= s * 1.0001, "x={} s={} z={} back={}", x, s, z, back);
    }
}

#[test]
fn ties_away_from_zero_not_to_even() {
    // banker's rounding would give 2 and -2 here
    assert_eq!(quantize(2.5, 1.0, 0), 3);
    assert_eq!(quantize(-2.5, 1.0, 0), -3);
    assert_eq!(quantize(0.75, 0.5, -10), -8);
}

#[test]
fn argmax_ties_break_low() {
    assert_eq!(argmax_i8(&[9; 10]), 0);
    assert_eq!(argmax_i8(&[-128, 4, -1, 4, 4]), 1);
    assert_eq!(argmax_i8(&[-128, -128, 127]), 2);
}
