//! Size registry.
//!
//! Reports how much host and device memory each object kind needs so the caller
//! can allocate it. Sizing is a pure function of the `DisplayInfo` captured at
//! connect time and the optional helper.

use core::mem::size_of;

use crate::backend::DisplayInfo;
use crate::error::{KindError, Result, Unsupported};
use crate::kind::ObjectKind;
use crate::object::{ContextHost, TargetHost, WindowHost};

/// Framebuffers are RGBA8.
pub const BYTES_PER_PIXEL: usize = 4;

/// Windows hold a front and a back framebuffer.
pub const WINDOW_BUFFERS: usize = 2;

/// Memory requirements for one object.
///
/// Allocating regions of exactly these sizes (device region aligned to
/// `device_alignment`) is always enough for construction to succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SizeDescriptor {
    /// CPU-only memory.
    pub host_bytes: usize,
    /// GPU-visible memory.
    pub device_bytes: usize,
    /// Required alignment of the device region. Always a power of two.
    pub device_alignment: usize,
}

/// Requested window dimensions.
///
/// This is only a hint: fixed-resolution displays replace it with the display size.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WindowHelper {
    pub width: u32,
    pub height: u32,
}

/// Render target dimensions. Usually filled from a window with `fill_target_helper`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TargetHelper {
    pub width: u32,
    pub height: u32,
}

/// Kind-specific sizing input.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SizingHelper {
    Window(WindowHelper),
    Target(TargetHelper),
}

impl From<WindowHelper> for SizingHelper {
    fn from(helper: WindowHelper) -> Self {
        SizingHelper::Window(helper)
    }
}

impl From<TargetHelper> for SizingHelper {
    fn from(helper: TargetHelper) -> Self {
        SizingHelper::Target(helper)
    }
}

pub(crate) fn query(
    display: &DisplayInfo,
    kind: ObjectKind,
    helper: Option<SizingHelper>,
) -> Result<SizeDescriptor> {
    let device_alignment = display.device_alignment;

    match (kind, helper) {
        (ObjectKind::Context, None) => Ok(SizeDescriptor {
            host_bytes: size_of::<ContextHost>(),
            device_bytes: framebuffer_bytes(display.width, display.height)?,
            device_alignment,
        }),
        (ObjectKind::Window, Some(SizingHelper::Window(h))) => {
            let (width, height) = window_extent(display, &h)?;
            let device_bytes = framebuffer_bytes(width, height)?
                .checked_mul(WINDOW_BUFFERS)
                .ok_or(Unsupported::SizeOverflow { width, height })?;
            Ok(SizeDescriptor {
                host_bytes: size_of::<WindowHost>(),
                device_bytes,
                device_alignment,
            })
        }
        (ObjectKind::Target, Some(SizingHelper::Target(h))) => {
            let (width, height) = target_extent(display, &h)?;
            Ok(SizeDescriptor {
                host_bytes: size_of::<TargetHost>(),
                device_bytes: framebuffer_bytes(width, height)?,
                device_alignment,
            })
        }
        (ObjectKind::Context, Some(_)) => Err(KindError::UnexpectedHelper(kind).into()),
        (_, None) => Err(KindError::MissingHelper(kind).into()),
        (_, Some(_)) => Err(KindError::WrongHelper(kind).into()),
    }
}

/// Resolves the window dimensions actually used for a helper.
pub(crate) fn window_extent(display: &DisplayInfo, helper: &WindowHelper) -> Result<(u32, u32)> {
    if display.fixed_resolution {
        return Ok((display.width, display.height));
    }
    check_extent(helper.width, helper.height, display.max_dimension)
}

pub(crate) fn target_extent(display: &DisplayInfo, helper: &TargetHelper) -> Result<(u32, u32)> {
    check_extent(helper.width, helper.height, display.max_dimension)
}

pub(crate) fn framebuffer_bytes(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| Unsupported::SizeOverflow { width, height }.into())
}

fn check_extent(width: u32, height: u32, max: u32) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(Unsupported::ZeroExtent { width, height }.into());
    }
    if width > max || height > max {
        return Err(Unsupported::ExceedsMaximum { width, height, max }.into());
    }
    Ok((width, height))
}
