use std::marker::PhantomData;
use std::time::Duration;

use crate::caps::{DrawFeatures, MeshFeatures};
use crate::error::{LapisError, Result};
use crate::size::BYTES_PER_PIXEL;
use crate::time::VsyncClock;

use super::{Backend, DisplayInfo, Frame, WindowEvent, WindowSlot};

/// Window table capacity.
pub const MAX_WINDOWS: usize = 8;

/// Pending events per window; further events are refused until the next poll.
const EVENT_QUEUE: usize = 16;

/// Build-time characteristics of a simulated platform.
pub trait Profile {
    const NAME: &'static str;
    const MESH_FEATURES: MeshFeatures;
    const DRAW_FEATURES: DrawFeatures;
    /// Display resolution when the platform always renders full screen.
    const FIXED_RESOLUTION: Option<(u32, u32)>;
    const MAX_DIMENSION: u32;
    const DEVICE_ALIGNMENT: usize;
}

/// Desktop-class GPU: any window size, per-vertex colors, index buffers.
#[derive(Debug, Copy, Clone, Default)]
pub struct DesktopProfile;

impl Profile for DesktopProfile {
    const NAME: &'static str = "headless-desktop";
    const MESH_FEATURES: MeshFeatures = MeshFeatures::VERTEX_POS
        .union(MeshFeatures::INDEX_BUFFER)
        .union(MeshFeatures::VERTEX_COLOR);
    const DRAW_FEATURES: DrawFeatures = DrawFeatures::empty();
    const FIXED_RESOLUTION: Option<(u32, u32)> = None;
    const MAX_DIMENSION: u32 = 8192;
    const DEVICE_ALIGNMENT: usize = 256;
}

/// Fixed-function console: 320x240 full screen, flat shading only.
#[derive(Debug, Copy, Clone, Default)]
pub struct ConsoleProfile;

impl Profile for ConsoleProfile {
    const NAME: &'static str = "headless-console";
    const MESH_FEATURES: MeshFeatures = MeshFeatures::VERTEX_POS.union(MeshFeatures::INDEX_BUFFER);
    const DRAW_FEATURES: DrawFeatures = DrawFeatures::empty();
    const FIXED_RESOLUTION: Option<(u32, u32)> = Some((320, 240));
    const MAX_DIMENSION: u32 = 320;
    const DEVICE_ALIGNMENT: usize = 64;
}

/// Headless backend configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Reported display size. Ignored by fixed-resolution profiles.
    pub display_width: u32,
    pub display_height: u32,

    /// Simulated vblank interval. `None` presents without blocking.
    pub vsync_interval: Option<Duration>,

    /// Queue a close request on each window after it has presented this many frames.
    pub close_after_frames: Option<u32>,
}

impl HeadlessConfig {
    /// Never blocks on present. Intended for tests.
    pub fn unpaced() -> Self {
        Self {
            vsync_interval: None,
            ..Self::default()
        }
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            display_width: 1280,
            display_height: 720,
            vsync_interval: Some(Duration::from_secs(1) / 60),
            close_after_frames: None,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct HeadlessWindow {
    width: u32,
    height: u32,
    events: [Option<WindowEvent>; EVENT_QUEUE],
    queued: usize,
    presented: u32,
    last_frame_index: u32,
    close_queued: bool,
}

impl HeadlessWindow {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            events: [None; EVENT_QUEUE],
            queued: 0,
            presented: 0,
            last_frame_index: 0,
            close_queued: false,
        }
    }

    fn push(&mut self, event: WindowEvent) -> bool {
        if self.queued == EVENT_QUEUE {
            return false;
        }
        self.events[self.queued] = Some(event);
        self.queued += 1;
        true
    }
}

/// In-process platform with no display.
///
/// Window and event tables have fixed capacity, presentation is paced by a
/// `VsyncClock`, and window-system events are scripted with `push_event`.
#[derive(Debug)]
pub struct HeadlessBackend<P = DesktopProfile> {
    config: HeadlessConfig,
    connected: bool,
    windows: [Option<HeadlessWindow>; MAX_WINDOWS],
    clock: VsyncClock,
    _profile: PhantomData<P>,
}

impl<P: Profile> HeadlessBackend<P> {
    pub fn new(config: HeadlessConfig) -> Self {
        let clock = VsyncClock::new(config.vsync_interval);
        Self {
            config,
            connected: false,
            windows: [None; MAX_WINDOWS],
            clock,
            _profile: PhantomData,
        }
    }

    /// Queues a window-system event for the next `poll_events`.
    ///
    /// Returns `false` if the window does not exist or its queue is full.
    pub fn push_event(&mut self, window: WindowSlot, event: WindowEvent) -> bool {
        self.slot_mut(window).is_ok_and(|w| w.push(event))
    }

    /// Frames presented on `window` so far.
    pub fn presented_frames(&self, window: WindowSlot) -> Option<u32> {
        self.slot(window).map(|w| w.presented)
    }

    /// Index carried by the last frame presented on `window`.
    pub fn last_frame_index(&self, window: WindowSlot) -> Option<u32> {
        self.slot(window).filter(|w| w.presented > 0).map(|w| w.last_frame_index)
    }

    pub fn open_windows(&self) -> usize {
        self.windows.iter().flatten().count()
    }

    fn slot(&self, window: WindowSlot) -> Option<&HeadlessWindow> {
        self.windows.get(window.0 as usize)?.as_ref()
    }

    fn slot_mut(&mut self, window: WindowSlot) -> Result<&mut HeadlessWindow> {
        self.windows
            .get_mut(window.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| LapisError::backend(format!("no open window in slot {}", window.0)))
    }
}

impl<P: Profile> Default for HeadlessBackend<P> {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl<P: Profile> Backend for HeadlessBackend<P> {
    const NAME: &'static str = P::NAME;
    const MESH_FEATURES: MeshFeatures = P::MESH_FEATURES;
    const DRAW_FEATURES: DrawFeatures = P::DRAW_FEATURES;

    fn connect(&mut self) -> Result<DisplayInfo> {
        let (width, height) = P::FIXED_RESOLUTION
            .unwrap_or((self.config.display_width, self.config.display_height));
        if width == 0 || height == 0 {
            return Err(LapisError::backend("display reports a zero size"));
        }

        self.connected = true;
        self.clock.reset();

        Ok(DisplayInfo {
            width,
            height,
            fixed_resolution: P::FIXED_RESOLUTION.is_some(),
            max_dimension: P::MAX_DIMENSION,
            device_alignment: P::DEVICE_ALIGNMENT,
        })
    }

    fn open_window(&mut self, width: u32, height: u32) -> Result<WindowSlot> {
        if !self.connected {
            return Err(LapisError::backend("headless display is not connected"));
        }

        let Some(index) = self.windows.iter().position(Option::is_none) else {
            return Err(LapisError::backend(format!(
                "all {MAX_WINDOWS} window slots are in use"
            )));
        };

        self.windows[index] = Some(HeadlessWindow::new(width, height));
        log::debug!("{}: opened {width}x{height} window in slot {index}", P::NAME);
        Ok(WindowSlot(index as u32))
    }

    fn poll_events(&mut self, window: WindowSlot, sink: &mut dyn FnMut(WindowEvent)) -> Result<()> {
        let w = self.slot_mut(window)?;
        for event in w.events[..w.queued].iter_mut().filter_map(Option::take) {
            sink(event);
        }
        w.queued = 0;
        Ok(())
    }

    fn present(&mut self, window: WindowSlot, frame: Frame<'_>) -> Result<()> {
        let close_after = self.config.close_after_frames;
        let w = self.slot_mut(window)?;

        let expected = w.width as usize * w.height as usize * BYTES_PER_PIXEL;
        if (frame.width, frame.height) != (w.width, w.height) || frame.pixels.len() != expected {
            return Err(LapisError::backend(format!(
                "frame {}x{} ({} bytes) does not match {}x{} window",
                frame.width,
                frame.height,
                frame.pixels.len(),
                w.width,
                w.height
            )));
        }

        w.presented += 1;
        w.last_frame_index = frame.index;

        if let Some(limit) = close_after {
            if w.presented >= limit && !w.close_queued {
                w.close_queued = w.push(WindowEvent::CloseRequested);
            }
        }

        self.clock.wait();
        Ok(())
    }

    fn close_window(&mut self, window: WindowSlot) -> Result<()> {
        self.slot_mut(window)?;
        self.windows[window.0 as usize] = None;
        log::debug!("{}: closed window in slot {}", P::NAME, window.0);
        Ok(())
    }
}
