//! Backend capability masks.
//!
//! Each backend type carries its masks as associated constants, so they are fixed
//! at build time and identical for the whole process. Callers branch on them before
//! loading or submitting attributes; anything outside a mask is dropped silently.

use bitflags::bitflags;

bitflags! {
    /// Per-vertex attributes and texture kinds a backend accepts.
    ///
    /// This also tells asset loaders what not to bother loading: a backend without
    /// `TEXTURE_NORMAL` never needs normal maps read from disk.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct MeshFeatures: u32 {
        /// Vertex positions. Every backend supports these.
        const VERTEX_POS = 1 << 0;
        /// Geometry submitted together with an index buffer.
        const INDEX_BUFFER = 1 << 1;
        /// Per-vertex colors.
        const VERTEX_COLOR = 1 << 2;
        /// Per-vertex normal vectors.
        const VERTEX_NORM = 1 << 3;
        /// Per-vertex tangent vectors.
        const VERTEX_TANGENT = 1 << 4;
        /// Texture coordinates, needed for any texture.
        const VERTEX_TEX_UV = 1 << 5;
        /// Albedo textures.
        const TEXTURE_ALBEDO = 1 << 6;
        /// Normal map textures.
        const TEXTURE_NORMAL = 1 << 7;
    }
}

bitflags! {
    /// Optional effects that can be applied to an individual draw.
    ///
    /// These do not affect asset loading.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
    pub struct DrawFeatures: u32 {
        /// Shadows computed at runtime from lights.
        const DYNAMIC_SHADOWS = 1 << 0;
    }
}

impl Default for MeshFeatures {
    fn default() -> Self {
        MeshFeatures::VERTEX_POS
    }
}
