//! Immediate-mode triangle submission.
//!
//! Geometry is handed over as flat float arrays on every call instead of being
//! uploaded as a mesh first. Only attributes inside the backend's capability
//! masks are read; the rest are dropped without error so that callers can submit
//! the same arrays to every backend.

use crate::caps::{DrawFeatures, MeshFeatures};
use crate::error::{LapisError, Result};
use crate::raster::{Rgb, Vertex};

const POSITION_COMPONENTS: usize = 3;
const COLOR_COMPONENTS: usize = 3;
const NORMAL_COMPONENTS: usize = 3;
const TANGENT_COMPONENTS: usize = 3;
const TEX_COORD_COMPONENTS: usize = 2;

/// One immediate-mode draw.
///
/// Without `indices`, vertices are consumed in order, three per triangle, so
/// `positions` holds `9 * triangle_count` floats (xyz per vertex). With `indices`,
/// every triangle reads three indices into the vertex arrays.
#[derive(Debug, Copy, Clone, Default)]
pub struct ImmediateDraw<'a> {
    pub positions: &'a [f32],
    /// RGB per vertex.
    pub colors: Option<&'a [f32]>,
    /// XYZ per vertex.
    pub normals: Option<&'a [f32]>,
    /// XYZ per vertex.
    pub tangents: Option<&'a [f32]>,
    /// UV per vertex.
    pub tex_coords: Option<&'a [f32]>,
    pub indices: Option<&'a [u32]>,
    pub triangle_count: u32,
    /// Requested per-draw effects.
    pub effects: DrawFeatures,
}

impl<'a> ImmediateDraw<'a> {
    pub fn new(positions: &'a [f32], triangle_count: u32) -> Self {
        Self {
            positions,
            triangle_count,
            ..Self::default()
        }
    }

    pub fn with_colors(mut self, colors: &'a [f32]) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_normals(mut self, normals: &'a [f32]) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_tangents(mut self, tangents: &'a [f32]) -> Self {
        self.tangents = Some(tangents);
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: &'a [f32]) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn with_indices(mut self, indices: &'a [u32]) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_effects(mut self, effects: DrawFeatures) -> Self {
        self.effects = effects;
        self
    }

    /// Mesh features this draw makes use of.
    pub fn attributes(&self) -> MeshFeatures {
        let mut used = MeshFeatures::VERTEX_POS;
        used.set(MeshFeatures::VERTEX_COLOR, self.colors.is_some());
        used.set(MeshFeatures::VERTEX_NORM, self.normals.is_some());
        used.set(MeshFeatures::VERTEX_TANGENT, self.tangents.is_some());
        used.set(MeshFeatures::VERTEX_TEX_UV, self.tex_coords.is_some());
        used.set(MeshFeatures::INDEX_BUFFER, self.indices.is_some());
        used
    }
}

/// A validated draw restricted to what the backend consumes.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Prepared<'a> {
    positions: &'a [f32],
    colors: Option<&'a [f32]>,
    indices: Option<&'a [u32]>,
    triangle_count: usize,
}

impl<'a> Prepared<'a> {
    /// Validates `draw` against the capability masks.
    ///
    /// Returns `Ok(None)` when the draw must be skipped: it relies on an index
    /// buffer the backend does not accept.
    pub(crate) fn new(
        draw: &ImmediateDraw<'a>,
        mesh: MeshFeatures,
        effects: DrawFeatures,
    ) -> Result<Option<Self>> {
        let triangle_count = draw.triangle_count as usize;

        let dropped = draw.attributes().difference(mesh);
        if dropped.contains(MeshFeatures::INDEX_BUFFER) {
            log::trace!("indexed draw skipped; backend has no index buffer support");
            return Ok(None);
        }
        if !dropped.is_empty() {
            log::trace!("dropping unsupported attributes {dropped:?}");
        }
        let dropped_fx = draw.effects.difference(effects);
        if !dropped_fx.is_empty() {
            log::trace!("dropping unsupported draw effects {dropped_fx:?}");
        }

        let vertex_count = match draw.indices {
            Some(indices) => {
                let needed = triangle_count.saturating_mul(3);
                require("indices", needed, indices.len())?;
                indices[..needed]
                    .iter()
                    .max()
                    .map_or(0, |&max| max as usize + 1)
            }
            None => triangle_count.saturating_mul(3),
        };

        require(
            "positions",
            vertex_count.saturating_mul(POSITION_COMPONENTS),
            draw.positions.len(),
        )?;

        let keep = |attr, data: Option<&'a [f32]>| data.filter(|_| mesh.contains(attr));

        let colors = keep(MeshFeatures::VERTEX_COLOR, draw.colors);
        let checks = [
            ("colors", colors, COLOR_COMPONENTS),
            ("normals", keep(MeshFeatures::VERTEX_NORM, draw.normals), NORMAL_COMPONENTS),
            ("tangents", keep(MeshFeatures::VERTEX_TANGENT, draw.tangents), TANGENT_COMPONENTS),
            ("tex_coords", keep(MeshFeatures::VERTEX_TEX_UV, draw.tex_coords), TEX_COORD_COMPONENTS),
        ];
        for (attribute, data, components) in checks {
            if let Some(data) = data {
                require(attribute, vertex_count.saturating_mul(components), data.len())?;
            }
        }

        Ok(Some(Self {
            positions: draw.positions,
            colors,
            indices: draw.indices,
            triangle_count,
        }))
    }

    pub(crate) fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        (0..self.triangle_count).map(move |t| {
            [0, 1, 2].map(|corner| {
                let i = t * 3 + corner;
                let vertex = match self.indices {
                    Some(indices) => indices[i] as usize,
                    None => i,
                };
                self.vertex(vertex)
            })
        })
    }

    fn vertex(&self, i: usize) -> Vertex {
        let p = &self.positions[i * POSITION_COMPONENTS..];
        let color = match self.colors {
            Some(c) => {
                let c = &c[i * COLOR_COMPONENTS..];
                Rgb::new(c[0], c[1], c[2])
            }
            None => Rgb::white(),
        };
        Vertex {
            pos: [p[0], p[1]],
            color,
        }
    }
}

fn require(attribute: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual < expected {
        return Err(LapisError::InvalidGeometry {
            attribute,
            expected,
            actual,
        });
    }
    Ok(())
}
