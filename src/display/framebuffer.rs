/// 1-bit framebuffer in SSD1306 page layout: each byte is a vertical strip of
/// 8 pixels, bit `y % 8` of byte `x + (y / 8) * width`.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    buf: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pages = (height + 7) / 8;
        Self { width, height, buf: vec![0u8; width * pages] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    pub fn clear(&mut self) { self.fill(false); }

    pub fn fill(&mut self, on: bool) {
        let v = if on { 0xFF } else { 0x00 };
        for b in self.buf.iter_mut() { *b = v; }
    }

    /// Out-of-bounds writes are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        if x >= self.width || y >= self.height { return; }
        let idx = x + (y / 8) * self.width;
        let mask = 1u8 << (y % 8);
        if on { self.buf[idx] |= mask; } else { self.buf[idx] &= !mask; }
    }

    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height { return false; }
        self.buf[x + (y / 8) * self.width] & (1u8 << (y % 8)) != 0
    }

    /// Padding rows of a partial last page are not counted.
    pub fn lit_pixels(&self) -> usize {
        (0..self.height).map(|y| (0..self.width).filter(|&x| self.get_pixel(x, y)).count()).sum()
    }

    pub fn as_bytes(&self) -> &[u8] { &self.buf }

    /// One text row per pixel row, `#` for lit pixels.
    pub fn to_ascii(&self) -> String {
        let mut s = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width { s.push(if self.get_pixel(x, y) { '#' } else { '.' }); }
            s.push('\n');
        }
        s
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Framebuffer({}x{}, {} lit)", self.width, self.height, self.lit_pixels())
    }
}
