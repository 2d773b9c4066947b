use super::Rgb;
use crate::size::BYTES_PER_PIXEL;

/// One immediate-mode vertex in lapis screen space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Vertex {
    pub pos: [f32; 2],
    pub color: Rgb,
}

/// Mutable view over an RGBA8 framebuffer living in device memory.
pub(crate) struct Canvas<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(pixels: &'a mut [u8], width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        debug_assert!(pixels.len() >= len, "canvas smaller than {width}x{height}");
        Self {
            pixels: &mut pixels[..len],
            width,
            height,
        }
    }

    pub(crate) fn clear(&mut self, color: Rgb) {
        let px = color.to_rgba8();
        for chunk in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Fills one triangle and returns the number of pixels written.
    ///
    /// Either winding is accepted. Degenerate and non-finite triangles are skipped.
    pub(crate) fn fill_triangle(&mut self, tri: &[Vertex; 3]) -> u32 {
        let [a, b, c] = tri.map(|v| self.to_pixel(v.pos));
        if !(a.iter().chain(&b).chain(&c).all(|v| v.is_finite())) {
            return 0;
        }

        let area = edge(a, b, c);
        if area == 0.0 {
            return 0;
        }
        let inv_area = 1.0 / area;

        let (w, h) = (self.width as f32, self.height as f32);
        let x0 = a[0].min(b[0]).min(c[0]).floor().max(0.0) as u32;
        let y0 = a[1].min(b[1]).min(c[1]).floor().max(0.0) as u32;
        let x1 = a[0].max(b[0]).max(c[0]).ceil().min(w) as u32;
        let y1 = a[1].max(b[1]).max(c[1]).ceil().min(h) as u32;

        let mut written = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = [x as f32 + 0.5, y as f32 + 0.5];

                // Normalised barycentrics; dividing by the signed area makes both
                // windings produce non-negative weights inside the triangle.
                let wa = edge(b, c, p) * inv_area;
                let wb = edge(c, a, p) * inv_area;
                let wc = edge(a, b, p) * inv_area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }

                let color = Rgb::new(
                    wa * tri[0].color.r + wb * tri[1].color.r + wc * tri[2].color.r,
                    wa * tri[0].color.g + wb * tri[1].color.g + wc * tri[2].color.g,
                    wa * tri[0].color.b + wb * tri[1].color.b + wc * tri[2].color.b,
                );
                self.put(x, y, color);
                written += 1;
            }
        }
        written
    }

    #[inline]
    fn to_pixel(&self, pos: [f32; 2]) -> [f32; 2] {
        [
            (pos[0] + 0.5) * self.width as f32,
            (0.5 - pos[1]) * self.height as f32,
        ]
    }

    #[inline]
    fn put(&mut self, x: u32, y: u32, color: Rgb) {
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.pixels[i..i + BYTES_PER_PIXEL].copy_from_slice(&color.to_rgba8());
    }
}

/// Twice the signed area of `(a, b, p)`.
#[inline]
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = (y * width + x) as usize * 4;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    fn v(x: f32, y: f32, color: Rgb) -> Vertex {
        Vertex { pos: [x, y], color }
    }

    // ── clear ─────────────────────────────────────────────────────────────

    #[test]
    fn clear_fills_every_pixel() {
        let mut buf = vec![0u8; 4 * 4 * 4];
        Canvas::new(&mut buf, 4, 4).clear(Rgb::new(1.0, 0.0, 0.0));
        assert!(buf.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    }

    // ── fill_triangle ─────────────────────────────────────────────────────

    #[test]
    fn covering_triangle_fills_centre() {
        let mut buf = vec![0u8; 8 * 8 * 4];
        let red = Rgb::new(1.0, 0.0, 0.0);
        let tri = [v(0.0, 0.5, red), v(0.5, -0.5, red), v(-0.5, -0.5, red)];
        let written = Canvas::new(&mut buf, 8, 8).fill_triangle(&tri);

        assert!(written > 0);
        assert_eq!(pixel(&buf, 8, 4, 5), [255, 0, 0, 255]);
        // Top corners lie outside the upward-pointing triangle.
        assert_eq!(pixel(&buf, 8, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&buf, 8, 7, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn both_windings_cover_the_same_pixels() {
        let white = Rgb::white();
        let ccw = [v(-0.4, -0.4, white), v(0.4, -0.4, white), v(0.0, 0.4, white)];
        let cw = [ccw[0], ccw[2], ccw[1]];

        let mut a = vec![0u8; 16 * 16 * 4];
        let mut b = vec![0u8; 16 * 16 * 4];
        let na = Canvas::new(&mut a, 16, 16).fill_triangle(&ccw);
        let nb = Canvas::new(&mut b, 16, 16).fill_triangle(&cw);
        assert_eq!(na, nb);
        assert_eq!(a, b);
    }

    #[test]
    fn colors_interpolate() {
        let mut buf = vec![0u8; 32 * 32 * 4];
        let tri = [
            v(-0.5, 0.5, Rgb::new(1.0, 0.0, 0.0)),
            v(0.5, 0.5, Rgb::new(0.0, 1.0, 0.0)),
            v(-0.5, -0.5, Rgb::new(0.0, 0.0, 1.0)),
        ];
        Canvas::new(&mut buf, 32, 32).fill_triangle(&tri);

        let near_red = pixel(&buf, 32, 0, 0);
        assert!(near_red[0] > 200 && near_red[1] < 30 && near_red[2] < 30);
        let near_blue = pixel(&buf, 32, 0, 30);
        assert!(near_blue[2] > 200 && near_blue[0] < 30);
    }

    #[test]
    fn degenerate_triangle_writes_nothing() {
        let mut buf = vec![0u8; 8 * 8 * 4];
        let w = Rgb::white();
        let line = [v(-0.5, 0.0, w), v(0.0, 0.0, w), v(0.5, 0.0, w)];
        assert_eq!(Canvas::new(&mut buf, 8, 8).fill_triangle(&line), 0);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn offscreen_and_non_finite_are_clipped() {
        let mut buf = vec![0u8; 8 * 8 * 4];
        let w = Rgb::white();
        let far = [v(10.0, 10.0, w), v(12.0, 10.0, w), v(11.0, 12.0, w)];
        assert_eq!(Canvas::new(&mut buf, 8, 8).fill_triangle(&far), 0);

        let nan = [v(f32::NAN, 0.0, w), v(0.5, 0.0, w), v(0.0, 0.5, w)];
        assert_eq!(Canvas::new(&mut buf, 8, 8).fill_triangle(&nan), 0);
    }

    #[test]
    fn huge_triangle_covers_everything() {
        let mut buf = vec![0u8; 8 * 8 * 4];
        let w = Rgb::white();
        let huge = [v(-100.0, -100.0, w), v(100.0, -100.0, w), v(0.0, 100.0, w)];
        assert_eq!(Canvas::new(&mut buf, 8, 8).fill_triangle(&huge), 64);
    }
}
