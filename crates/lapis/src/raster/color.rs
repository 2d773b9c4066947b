/// Straight (non-premultiplied) RGB color with components in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Packs into opaque RGBA8 bytes. Out-of-range and NaN components clamp to 0..=255.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        [unorm8(self.r), unorm8(self.g), unorm8(self.b), 0xFF]
    }
}

impl From<[f32; 3]> for Rgb {
    #[inline]
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[inline]
fn unorm8(x: f32) -> u8 {
    // Float-to-int `as` casts saturate and send NaN to 0.
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}
