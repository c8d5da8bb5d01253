use mnist_edge::{InferenceEngine, QuantMlp, QuantModel};
use std::fs::File;
use std::io::Write;

#[test]
fn saved_model_loads_back() {
    std::fs::create_dir_all("target").unwrap();
    let path = "target/mnist_model_roundtrip.q8";
    let m = QuantModel::random(8, 5);
    m.save(path).unwrap();
    let back = QuantModel::load(path).unwrap();
    assert_eq!(back.meta, m.meta);
    assert_eq!(back.input, m.input);
    assert_eq!(back.output, m.output);
    assert_eq!(back.w1, m.w1);
    assert_eq!(back.b2, m.b2);
    assert!(back.is_consistent());
}

#[test]
fn rejects_bad_magic() {
    std::fs::create_dir_all("target").unwrap();
    let path = "target/mnist_model_bad_magic.q8";
    let mut f = File::create(path).unwrap();
    f.write_all(b"PIENNQ01").unwrap();
    drop(f);
    let err = QuantModel::load(path).unwrap_err();
    assert!(err.to_string().contains("magic"));
}

#[test]
fn truncated_weights_are_an_error() {
    let mut bytes = Vec::new();
    QuantModel::random(4, 1).write_to(&mut bytes).unwrap();
    bytes.truncate(bytes.len() - 3);
    assert!(QuantModel::read_from(&mut bytes.as_slice()).is_err());
}

#[test]
fn loaded_model_runs() {
    let mut bytes = Vec::new();
    QuantModel::random(4, 2).write_to(&mut bytes).unwrap();
    let m = QuantModel::read_from(&mut bytes.as_slice()).unwrap();
    let mut e = QuantMlp::new(m);
    e.init().unwrap();
    for v in e.input_mut().iter_mut() { *v = 0; }
    e.invoke().unwrap();
    assert_eq!(e.output().len(), 10);
}

#[test]
fn oversized_header_is_rejected_before_reading_weights() {
    let mut bytes = b"MNISTQ01".to_vec();
    for v in [1u32, 784, u32::MAX, 10] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let err = QuantModel::read_from(&mut bytes.as_slice()).unwrap_err();
    assert!(err.to_string().contains("weight limit"), "{}", err);
}
