use log::debug;
use crate::engine::loader::QuantModel;
use crate::engine::InferenceEngine;
use crate::error::EngineStatus;
use crate::quant::quantize;

pub const DEFAULT_ARENA_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    offset: usize,
    len: usize,
}

impl Slot {
    fn range(&self) -> std::ops::Range<usize> { self.offset..self.offset + self.len }
}

/// Pure-Rust INT8 runtime for a [`QuantModel`]. Input, hidden and output
/// activations are carved out of one fixed tensor arena at `init`.
#[derive(Debug, Clone)]
pub struct QuantMlp {
    model: QuantModel,
    arena: Vec<i8>,
    used: usize,
    input: Slot,
    hidden: Slot,
    output: Slot,
    ready: bool,
}

impl QuantMlp {
    pub fn new(model: QuantModel) -> Self { Self::with_arena(model, DEFAULT_ARENA_BYTES) }

    pub fn with_arena(model: QuantModel, arena_bytes: usize) -> Self {
        Self {
            model,
            arena: vec![0i8; arena_bytes],
            used: 0,
            input: Slot::default(),
            hidden: Slot::default(),
            output: Slot::default(),
            ready: false,
        }
    }

    pub fn model(&self) -> &QuantModel { &self.model }

    fn alloc(&mut self, len: usize) -> Result<Slot, EngineStatus> {
        if self.used + len > self.arena.len() {
            debug!("arena exhausted: need {} more bytes, {} left", len, self.arena.len() - self.used);
            return Err(EngineStatus::ARENA_EXHAUSTED);
        }
        let slot = Slot { offset: self.used, len };
        self.used += len;
        Ok(slot)
    }
}

impl InferenceEngine for QuantMlp {
    fn init(&mut self) -> Result<(), EngineStatus> {
        self.ready = false;
        self.used = 0;
        let m = &self.model;
        let scales_ok = [m.input.scale, m.hidden.scale, m.output.scale, m.w1_scale, m.w2_scale]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0);
        if !m.is_consistent() || !scales_ok {
            return Err(EngineStatus::ERROR);
        }
        let (n, h, o) = (m.meta.input_dim, m.meta.hidden_dim, m.meta.output_dim);
        self.input = self.alloc(n)?;
        self.hidden = self.alloc(h)?;
        self.output = self.alloc(o)?;
        for v in self.arena[..self.used].iter_mut() { *v = 0; }
        self.ready = true;
        Ok(())
    }

    fn arena_used_bytes(&self) -> usize { self.used }

    fn input_mut(&mut self) -> &mut [i8] {
        let r = self.input.range();
        &mut self.arena[r]
    }

    fn output(&self) -> &[i8] { &self.arena[self.output.range()] }

    fn input_scale(&self) -> f32 { self.model.input.scale }
    fn input_zero_point(&self) -> i32 { self.model.input.zero_point }
    fn output_scale(&self) -> f32 { self.model.output.scale }
    fn output_zero_point(&self) -> i32 { self.model.output.zero_point }

    fn invoke(&mut self) -> Result<(), EngineStatus> {
        if !self.ready {
            return Err(EngineStatus::NOT_INITIALIZED);
        }
        let m = &self.model;
        let (n, h) = (m.meta.input_dim, m.meta.hidden_dim);
        let (zi, zh) = (m.input.zero_point, m.hidden.zero_point);

        // dense 1 + ReLU: relu in the quantized domain clamps at the zero point
        let m1 = m.input.scale * m.w1_scale;
        for j in 0..h {
            let row = &m.w1[j * n..(j + 1) * n];
            let x = &self.arena[self.input.range()];
            // i64 so a bias at the edge of i32 cannot overflow
            let mut acc = m.b1[j] as i64;
            for i in 0..n { acc += ((x[i] as i32 - zi) * row[i] as i32) as i64; }
            let q = quantize(acc as f32 * m1, m.hidden.scale, zh);
            self.arena[self.hidden.offset + j] = q.max(zh.clamp(-128, 127) as i8);
        }

        // dense 2
        let m2 = m.hidden.scale * m.w2_scale;
        for k in 0..m.meta.output_dim {
            let row = &m.w2[k * h..(k + 1) * h];
            let y = &self.arena[self.hidden.range()];
            let mut acc = m.b2[k] as i64;
            for j in 0..h { acc += ((y[j] as i32 - zh) * row[j] as i32) as i64; }
            self.arena[self.output.offset + k] = quantize(acc as f32 * m2, m.output.scale, m.output.zero_point);
        }
        Ok(())
    }
}
