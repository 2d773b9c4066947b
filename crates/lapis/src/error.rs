use thiserror::Error;

use crate::kind::ObjectKind;

/// Result alias used by every fallible lapis entry point.
pub type Result<T> = std::result::Result<T, LapisError>;

/// Error taxonomy for lapis.
///
/// Construction and connection errors must always be checked. Per-frame calls
/// (clear, draw, schedule) are usually successful and may be ignored in hot paths.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LapisError {
    /// A sizing or construction call was made before `connect`.
    #[error("lapis is not connected; call `connect` first")]
    NotConnected,

    /// `connect` was called a second time.
    #[error("lapis is already connected")]
    AlreadyConnected,

    /// Unrecognized object kind, or a helper that does not match the kind.
    #[error("invalid object kind: {0}")]
    InvalidKind(#[from] KindError),

    /// The backend cannot satisfy the requested size or feature.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(#[from] Unsupported),

    /// Caller memory does not satisfy the reported `SizeDescriptor`.
    #[error("invalid region: {0}")]
    InvalidRegion(#[from] RegionError),

    /// Immediate-mode attribute arrays are too short or reference missing vertices.
    #[error("invalid geometry: `{attribute}` needs {expected} elements, got {actual}")]
    InvalidGeometry {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Opaque platform failure (window system, device loss, ...).
    #[error("backend failure: {0}")]
    BackendFailure(String),
}

impl LapisError {
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        Self::BackendFailure(err.to_string())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum KindError {
    #[error("unrecognized kind tag {0}")]
    Unrecognized(u32),
    #[error("{0} requires a sizing helper")]
    MissingHelper(ObjectKind),
    #[error("{0} does not take a sizing helper")]
    UnexpectedHelper(ObjectKind),
    #[error("{0} was given a helper for another kind")]
    WrongHelper(ObjectKind),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum Unsupported {
    #[error("{width}x{height} has a zero extent")]
    ZeroExtent { width: u32, height: u32 },
    #[error("{width}x{height} exceeds the backend maximum of {max}")]
    ExceedsMaximum { width: u32, height: u32, max: u32 },
    #[error("byte size of {width}x{height} overflows")]
    SizeOverflow { width: u32, height: u32 },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum RegionError {
    #[error("{region} region holds {actual} bytes, {required} required")]
    TooSmall {
        region: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("device region is not aligned to {alignment} bytes")]
    Misaligned { alignment: usize },
    #[error("device alignment {alignment} is not a power of two")]
    BadAlignment { alignment: usize },
    #[error("arena has {remaining} bytes left, {required} required")]
    ArenaExhausted { required: usize, remaining: usize },
}
