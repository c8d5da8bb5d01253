use std::fmt;
use crate::config::{MNIST_H, MNIST_SIZE, MNIST_W, NUM_CLASSES};

/// One 28x28 grayscale image, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct RawSample {
    pixels: [u8; MNIST_SIZE],
}

impl RawSample {
    pub const fn zeros() -> Self { Self { pixels: [0u8; MNIST_SIZE] } }

    pub fn from_pixels(pixels: [u8; MNIST_SIZE]) -> Self { Self { pixels } }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 { self.pixels[y * MNIST_W + x] }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; MNIST_SIZE] { &self.pixels }

    #[inline]
    pub fn as_mut_bytes(&mut self) -> &mut [u8; MNIST_SIZE] { &mut self.pixels }
}

impl Default for RawSample {
    fn default() -> Self { Self::zeros() }
}

impl fmt::Debug for RawSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.pixels.iter().filter(|&&p| p > 0).count();
        write!(f, "RawSample({}x{}, {} non-zero)", MNIST_W, MNIST_H, lit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores(pub [f32; NUM_CLASSES]);

impl Scores {
    pub fn get(&self, class: usize) -> Option<f32> { self.0.get(class).copied() }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub prediction: usize,
    pub scores: Scores,
}

/// The three report lines for a finished cycle.
pub fn format_report(c: &Classification) -> [String; 3] {
    let scores = c
        .scores
        .0
        .iter()
        .enumerate()
        .map(|(i, y)| format!("c{}: {:.3}", i, y))
        .collect::<Vec<_>>()
        .join("  ");
    [
        format!("Predição: {}", c.prediction),
        scores,
        "Pressione ENTER para enviar nova amostra...".to_string(),
    ]
}
