use core::fmt;

use crate::error::{KindError, LapisError};

/// Tag selecting which sizing and construction rules apply to an object.
///
/// The set is closed; raw tags read back from memory or across an FFI seam go
/// through `TryFrom<u32>`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum ObjectKind {
    /// Holds the connection-wide state everything else hangs off.
    Context = 1,
    /// A presentable surface with front/back framebuffers.
    Window = 2,
    /// An area that can be cleared and drawn to.
    Target = 3,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [ObjectKind::Context, ObjectKind::Window, ObjectKind::Target];

    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Whether sizing this kind depends on a caller-provided helper.
    #[inline]
    pub const fn takes_helper(self) -> bool {
        !matches!(self, ObjectKind::Context)
    }
}

impl TryFrom<u32> for ObjectKind {
    type Error = LapisError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(ObjectKind::Context),
            2 => Ok(ObjectKind::Window),
            3 => Ok(ObjectKind::Target),
            other => Err(KindError::Unrecognized(other).into()),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Context => "context",
            ObjectKind::Window => "window",
            ObjectKind::Target => "target",
        };
        f.write_str(name)
    }
}
