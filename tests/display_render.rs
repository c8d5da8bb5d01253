use mnist_edge::{DisplayAdapter, EmulatorOled, OledConfig, RawSample};

fn panel(w: usize, h: usize) -> OledConfig {
    OledConfig { width: w, height: h, external_vcc: false, address: 0x3C, port: 1 }
}

fn square_sample() -> RawSample {
    let mut s = RawSample::zeros();
    for y in 0..28 {
        for x in 0..28 {
            if x == 0 || y == 0 || x == 27 || y == 27 { s.as_mut_bytes()[y * 28 + x] = 255; }
        }
    }
    s
}

#[test]
fn sample_is_centered_on_128x64() {
    let mut d = DisplayAdapter::new(EmulatorOled::default(), panel(128, 64), false).unwrap();
    d.render(&square_sample()).unwrap();
    let fb = d.framebuffer();
    assert!(fb.get_pixel(50, 18));
    assert!(fb.get_pixel(77, 45));
    assert!(!fb.get_pixel(49, 18));
    assert!(!fb.get_pixel(50, 17));
    assert!(!fb.get_pixel(78, 45));
    assert_eq!(fb.lit_pixels(), 4 * 27);
}

#[test]
fn dim_pixels_stay_dark() {
    let mut s = RawSample::zeros();
    s.as_mut_bytes()[0] = 127;
    s.as_mut_bytes()[1] = 128;
    let mut d = DisplayAdapter::new(EmulatorOled::default(), panel(128, 64), false).unwrap();
    d.render(&s).unwrap();
    assert!(!d.framebuffer().get_pixel(50, 18));
    assert!(d.framebuffer().get_pixel(51, 18));
}

#[test]
fn flush_counts_per_policy() {
    let mut single = DisplayAdapter::new(EmulatorOled::default(), panel(128, 64), false).unwrap();
    single.render(&square_sample()).unwrap();
    assert_eq!(single.oled().frames().len(), 2); // startup blank + content

    let mut double = DisplayAdapter::new(EmulatorOled::default(), panel(128, 64), true).unwrap();
    double.render(&square_sample()).unwrap();
    let frames = double.oled().frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1].lit_pixels(), 0);
    assert_eq!(frames[2].lit_pixels(), 4 * 27);
}

#[test]
fn previous_sample_is_cleared() {
    let mut d = DisplayAdapter::new(EmulatorOled::default(), panel(128, 64), false).unwrap();
    d.render(&square_sample()).unwrap();
    d.render(&RawSample::zeros()).unwrap();
    assert_eq!(d.framebuffer().lit_pixels(), 0);
}
