//! Software rasterization into RGBA8 device memory.
//!
//! Immediate-mode draws land here: positions are mapped from lapis screen space
//! (origin at the centre, visible area [-0.5, 0.5] on both axes, +Y up) to pixel
//! space and filled with per-vertex color interpolation. Depth is ignored; later
//! triangles paint over earlier ones.

mod canvas;
mod color;

pub use color::Rgb;

pub(crate) use canvas::{Canvas, Vertex};
