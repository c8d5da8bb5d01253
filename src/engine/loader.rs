use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use crate::config::{MNIST_SIZE, NUM_CLASSES};
use crate::quant::QuantParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantMeta {
    pub version: u32,
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
}

/// Two dense layers with per-tensor affine activations and symmetric weights.
/// Biases are i32 in accumulator scale (`act_scale * weight_scale`).
#[derive(Debug, Clone)]
pub struct QuantModel {
    pub meta: QuantMeta,
    pub input: QuantParams,
    pub hidden: QuantParams,
    pub output: QuantParams,
    pub w1_scale: f32,
    pub w2_scale: f32,
    pub w1: Vec<i8>,  // hidden x input
    pub b1: Vec<i32>, // hidden
    pub w2: Vec<i8>,  // output x hidden
    pub b2: Vec<i32>, // output
}

const Q_MAGIC: &[u8; 8] = b"MNISTQ01";

/// Upper bound on weights per layer accepted from a file header.
pub const MAX_LAYER_WEIGHTS: usize = 1 << 24;

fn layer_len(rows: usize, cols: usize, what: &str) -> Result<usize> {
    match rows.checked_mul(cols) {
        Some(n) if n <= MAX_LAYER_WEIGHTS => Ok(n),
        _ => bail!("{} is {}x{}, over the {} weight limit", what, rows, cols, MAX_LAYER_WEIGHTS),
    }
}

fn read_u32(r: &mut impl Read, what: &str) -> Result<u32> {
    let mut b4 = [0u8; 4];
    r.read_exact(&mut b4).with_context(|| format!("read {}", what))?;
    Ok(u32::from_le_bytes(b4))
}

fn read_i32(r: &mut impl Read, what: &str) -> Result<i32> {
    Ok(read_u32(r, what)? as i32)
}

fn read_f32(r: &mut impl Read, what: &str) -> Result<f32> {
    Ok(f32::from_bits(read_u32(r, what)?))
}

fn read_params(r: &mut impl Read, what: &str) -> Result<QuantParams> {
    let scale = read_f32(r, what)?;
    let zero_point = read_i32(r, what)?;
    Ok(QuantParams::new(scale, zero_point))
}

fn read_i8s(r: &mut impl Read, n: usize, what: &str) -> Result<Vec<i8>> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf).with_context(|| format!("read {} ({} bytes)", what, n))?;
    Ok(buf.into_iter().map(|b| b as i8).collect())
}

fn read_i32s(r: &mut impl Read, n: usize, what: &str) -> Result<Vec<i32>> {
    let mut buf = vec![0u8; n * 4];
    r.read_exact(&mut buf).with_context(|| format!("read {} ({} values)", what, n))?;
    Ok(buf.chunks_exact(4).map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}

impl QuantModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(&path).with_context(|| format!("open model file: {}", path.as_ref().display()))?;
        Self::read_from(&mut BufReader::new(f))
    }

    pub fn read_from(r: &mut impl Read) -> Result<Self> {
        // Format (little endian):
        // magic: 8 bytes b"MNISTQ01"
        // u32 version
        // u32 input_dim, u32 hidden_dim, u32 output_dim
        // (f32 scale, i32 zero_point) for input, hidden, output activations
        // f32 w1_scale, f32 w2_scale
        // i8 w1[hidden*input], i32 b1[hidden]
        // i8 w2[output*hidden], i32 b2[output]
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).context("read magic")?;
        if &magic != Q_MAGIC { bail!("bad model magic"); }
        let version = read_u32(r, "version")?;
        let input_dim = read_u32(r, "input_dim")? as usize;
        let hidden_dim = read_u32(r, "hidden_dim")? as usize;
        let output_dim = read_u32(r, "output_dim")? as usize;
        if input_dim == 0 || hidden_dim == 0 || output_dim == 0 {
            bail!("model has an empty layer ({}x{}x{})", input_dim, hidden_dim, output_dim);
        }
        let w1_len = layer_len(hidden_dim, input_dim, "w1")?;
        let w2_len = layer_len(output_dim, hidden_dim, "w2")?;
        let input = read_params(r, "input params")?;
        let hidden = read_params(r, "hidden params")?;
        let output = read_params(r, "output params")?;
        let w1_scale = read_f32(r, "w1_scale")?;
        let w2_scale = read_f32(r, "w2_scale")?;
        let w1 = read_i8s(r, w1_len, "w1")?;
        let b1 = read_i32s(r, hidden_dim, "b1")?;
        let w2 = read_i8s(r, w2_len, "w2")?;
        let b2 = read_i32s(r, output_dim, "b2")?;
        Ok(Self {
            meta: QuantMeta { version, input_dim, hidden_dim, output_dim },
            input, hidden, output,
            w1_scale, w2_scale,
            w1, b1, w2, b2,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = File::create(&path).with_context(|| format!("create model file: {}", path.as_ref().display()))?;
        let mut w = BufWriter::new(f);
        self.write_to(&mut w)?;
        w.flush().context("flush model file")?;
        Ok(())
    }

    pub fn write_to(&self, w: &mut impl Write) -> Result<()> {
        let m = &self.meta;
        w.write_all(Q_MAGIC)?;
        for v in [m.version, m.input_dim as u32, m.hidden_dim as u32, m.output_dim as u32] {
            w.write_all(&v.to_le_bytes())?;
        }
        for p in [self.input, self.hidden, self.output] {
            w.write_all(&p.scale.to_le_bytes())?;
            w.write_all(&p.zero_point.to_le_bytes())?;
        }
        w.write_all(&self.w1_scale.to_le_bytes())?;
        w.write_all(&self.w2_scale.to_le_bytes())?;
        w.write_all(&self.w1.iter().map(|&x| x as u8).collect::<Vec<_>>())?;
        for b in &self.b1 { w.write_all(&b.to_le_bytes())?; }
        w.write_all(&self.w2.iter().map(|&x| x as u8).collect::<Vec<_>>())?;
        for b in &self.b2 { w.write_all(&b.to_le_bytes())?; }
        Ok(())
    }

    /// Randomly initialised 784-hidden-10 model with the usual TFLite
    /// activation ranges: input [0, 1] and output [0, 1) on zero point -128.
    pub fn random(hidden_dim: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        // std 0.05 is well inside the i8 range at w_scale 1/512
        let w_scale = 1.0f32 / 512.0;
        let mut weights = |n: usize| -> Vec<i8> {
            (0..n)
                .map(|_| {
                    let z: f32 = StandardNormal.sample(&mut rng);
                    (0.05 * z / w_scale).round().clamp(-127.0, 127.0) as i8
                })
                .collect()
        };
        let w1 = weights(hidden_dim * MNIST_SIZE);
        let w2 = weights(NUM_CLASSES * hidden_dim);
        Self {
            meta: QuantMeta { version: 1, input_dim: MNIST_SIZE, hidden_dim, output_dim: NUM_CLASSES },
            input: QuantParams::new(1.0 / 255.0, -128),
            hidden: QuantParams::new(0.05, -128),
            output: QuantParams::new(1.0 / 256.0, -128),
            w1_scale: w_scale,
            w2_scale: w_scale,
            w1,
            b1: vec![0; hidden_dim],
            w2,
            b2: vec![0; NUM_CLASSES],
        }
    }

    /// Tensor lengths agree with the header.
    pub fn is_consistent(&self) -> bool {
        let m = &self.meta;
        self.w1.len() == m.hidden_dim * m.input_dim
            && self.b1.len() == m.hidden_dim
            && self.w2.len() == m.output_dim * m.hidden_dim
            && self.b2.len() == m.output_dim
    }
}
