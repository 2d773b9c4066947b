//! Platform backends.
//!
//! A backend owns the platform side of lapis: display detection, window-system
//! windows, event pumping and presentation. Everything else (sizing, object
//! state, rasterization, scheduling) is backend-independent and lives in caller
//! memory.

mod headless;
mod windowed;

pub use headless::{ConsoleProfile, DesktopProfile, HeadlessBackend, HeadlessConfig, Profile};
pub use windowed::{WgpuBackend, WgpuConfig};

use crate::caps::{DrawFeatures, MeshFeatures};
use crate::error::Result;

/// Display state captured once at connect time.
///
/// All sizing queries are pure functions of this value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DisplayInfo {
    /// Display resolution in pixels.
    pub width: u32,
    pub height: u32,
    /// Windows always cover the display; window size hints are ignored.
    pub fixed_resolution: bool,
    /// Largest accepted window or target extent.
    pub max_dimension: u32,
    /// Required alignment of device regions. A power of two.
    pub device_alignment: usize,
}

/// Backend-side handle for an open window.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WindowSlot(pub u32);

/// Platform window events, already translated to lapis terms.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WindowEvent {
    /// The user asked for the window to close.
    CloseRequested,
    /// The platform window changed size. The framebuffer keeps its constructed size.
    Resized { width: u32, height: u32 },
    Focused(bool),
    /// Pointer position in window pixels.
    PointerMoved { x: f32, y: f32 },
}

/// A composed RGBA8 image ready for presentation.
#[derive(Debug, Copy, Clone)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Per-window frame counter.
    pub index: u32,
}

/// Platform contract.
///
/// The capability masks are associated constants: they are fixed when the
/// backend is built and identical for every caller in the process.
pub trait Backend {
    const NAME: &'static str;
    const MESH_FEATURES: MeshFeatures;
    const DRAW_FEATURES: DrawFeatures;

    /// Establishes the platform connection and reports the display.
    fn connect(&mut self) -> Result<DisplayInfo>;

    /// Opens a platform window whose framebuffer is `width` x `height`.
    fn open_window(&mut self, width: u32, height: u32) -> Result<WindowSlot>;

    /// Pumps pending platform events for `window` into `sink`. Never blocks.
    fn poll_events(&mut self, window: WindowSlot, sink: &mut dyn FnMut(WindowEvent)) -> Result<()>;

    /// Presents `frame` on `window`, blocking until the next vertical sync.
    fn present(&mut self, window: WindowSlot, frame: Frame<'_>) -> Result<()>;

    fn close_window(&mut self, window: WindowSlot) -> Result<()>;
}
