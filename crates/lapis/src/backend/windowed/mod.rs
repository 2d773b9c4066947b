//! Desktop backend on winit + wgpu.
//!
//! Lapis drives the frame loop itself, so the winit event loop is pumped
//! (`pump_app_events`) from `poll_events` and window creation rather than
//! handed control with `run_app`. Framebuffers are rasterized on the CPU,
//! uploaded to a texture and drawn to the window surface with a fullscreen
//! triangle. The surface uses FIFO presentation, which is what makes `swap`
//! wait for vertical sync.

mod gpu;
mod init;
mod shell;
mod surface;

pub use init::WgpuConfig;

use std::time::Duration;

use anyhow::Context;
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};

use crate::caps::{DrawFeatures, MeshFeatures};
use crate::error::{LapisError, Result};

use super::{Backend, DisplayInfo, Frame, WindowEvent, WindowSlot};
use gpu::{Gpu, WindowSurface};
use shell::Shell;

/// Pumps allowed for the window system to answer a request.
const PUMP_ATTEMPTS: usize = 64;

/// Windowed desktop backend.
///
/// Must live on the main thread on platforms that require it (macOS). winit
/// allows one event loop per process, so only one `WgpuBackend` can connect.
pub struct WgpuBackend {
    config: WgpuConfig,
    event_loop: Option<EventLoop<()>>,
    shell: Shell,
    instance: Option<wgpu::Instance>,
    gpu: Option<Gpu>,
    windows: Vec<Option<WindowSurface>>,
}

impl WgpuBackend {
    pub fn new(config: WgpuConfig) -> Self {
        let shell = Shell::new(config.title.clone(), config.fullscreen);
        Self {
            config,
            event_loop: None,
            shell,
            instance: None,
            gpu: None,
            windows: Vec::new(),
        }
    }

    /// Runs one non-blocking round of the event loop.
    fn pump(&mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .as_mut()
            .context("windowed backend is not connected")?;

        match event_loop.pump_app_events(Some(Duration::ZERO), &mut self.shell) {
            PumpStatus::Continue => Ok(()),
            PumpStatus::Exit(code) => anyhow::bail!("winit event loop exited with status {code}"),
        }
    }

    fn pump_until<T>(
        &mut self,
        what: &str,
        mut ready: impl FnMut(&mut Shell) -> Option<T>,
    ) -> anyhow::Result<T> {
        for _ in 0..PUMP_ATTEMPTS {
            self.pump()?;
            if let Some(value) = ready(&mut self.shell) {
                return Ok(value);
            }
        }
        anyhow::bail!("window system did not {what} after {PUMP_ATTEMPTS} event loop rounds")
    }

    fn connect_inner(&mut self) -> anyhow::Result<DisplayInfo> {
        anyhow::ensure!(self.event_loop.is_none(), "windowed backend is already connected");

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        self.event_loop = Some(event_loop);
        self.pump_until("resume", |shell| shell.is_resumed().then_some(()))?;

        let (width, height) = match self.shell.monitor() {
            Some(PhysicalSize { width, height }) => (width, height),
            None => {
                log::warn!(
                    "no monitor reported; assuming {}x{}",
                    self.config.fallback_resolution.0,
                    self.config.fallback_resolution.1
                );
                self.config.fallback_resolution
            }
        };
        anyhow::ensure!(width > 0 && height > 0, "display has zero size");

        self.instance = Some(wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        }));

        Ok(DisplayInfo {
            width,
            height,
            fixed_resolution: self.config.fullscreen,
            max_dimension: self.config.required_limits.max_texture_dimension_2d,
            device_alignment: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize,
        })
    }

    fn open_window_inner(&mut self, width: u32, height: u32) -> anyhow::Result<WindowSlot> {
        let index = match self.windows.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                self.windows.push(None);
                self.windows.len() - 1
            }
        };
        let slot = index as u32;

        self.shell.request_window(slot, width, height);
        let window = self
            .pump_until("create a window", |shell| shell.take_opened(slot))?
            .map_err(anyhow::Error::msg)
            .context("failed to create window")?;

        let instance = self
            .instance
            .as_ref()
            .context("windowed backend is not connected")?;
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        if self.gpu.is_none() {
            let gpu = pollster::block_on(Gpu::new(instance, &surface, &self.config))?;
            self.gpu = Some(gpu);
        }
        let gpu = self.gpu.as_mut().context("no GPU device")?;

        let surface = gpu.window_surface(window, surface, (width, height), &self.config)?;
        self.windows[index] = Some(surface);
        Ok(WindowSlot(slot))
    }

    fn poll_inner(&mut self, slot: WindowSlot, sink: &mut dyn FnMut(WindowEvent)) -> anyhow::Result<()> {
        self.pump()?;

        let Self {
            shell,
            gpu,
            windows,
            ..
        } = self;
        let gpu = gpu.as_ref();
        let mut target = windows.get_mut(slot.0 as usize).and_then(Option::as_mut);

        shell.drain_events(slot.0, |event| {
            if let WindowEvent::Resized { width, height } = event {
                if let (Some(gpu), Some(target)) = (gpu, target.as_deref_mut()) {
                    target.resize(gpu, PhysicalSize::new(width, height));
                }
            }
            sink(event);
        });
        Ok(())
    }

    fn present_inner(&mut self, slot: WindowSlot, frame: Frame<'_>) -> anyhow::Result<()> {
        let gpu = self.gpu.as_ref().context("no GPU device")?;
        let target = self
            .windows
            .get(slot.0 as usize)
            .and_then(Option::as_ref)
            .with_context(|| format!("no open window in slot {}", slot.0))?;

        let (width, height) = target.extent();
        anyhow::ensure!(
            (width, height) == (frame.width, frame.height),
            "frame {}x{} does not match {width}x{height} window",
            frame.width,
            frame.height,
        );
        gpu.present(target, frame.pixels)
    }
}

impl Default for WgpuBackend {
    fn default() -> Self {
        Self::new(WgpuConfig::default())
    }
}

fn failure(err: anyhow::Error) -> LapisError {
    LapisError::BackendFailure(format!("{err:#}"))
}

impl Backend for WgpuBackend {
    const NAME: &'static str = "wgpu";
    const MESH_FEATURES: MeshFeatures = MeshFeatures::VERTEX_POS
        .union(MeshFeatures::INDEX_BUFFER)
        .union(MeshFeatures::VERTEX_COLOR);
    const DRAW_FEATURES: DrawFeatures = DrawFeatures::empty();

    fn connect(&mut self) -> Result<DisplayInfo> {
        self.connect_inner().map_err(failure)
    }

    fn open_window(&mut self, width: u32, height: u32) -> Result<WindowSlot> {
        self.open_window_inner(width, height).map_err(failure)
    }

    fn poll_events(&mut self, window: WindowSlot, sink: &mut dyn FnMut(WindowEvent)) -> Result<()> {
        self.poll_inner(window, sink).map_err(failure)
    }

    fn present(&mut self, window: WindowSlot, frame: Frame<'_>) -> Result<()> {
        self.present_inner(window, frame).map_err(failure)
    }

    fn close_window(&mut self, window: WindowSlot) -> Result<()> {
        let closed = self
            .windows
            .get_mut(window.0 as usize)
            .and_then(Option::take)
            .ok_or_else(|| LapisError::backend(format!("no open window in slot {}", window.0)))?;
        drop(closed);
        log::debug!("wgpu: closed window in slot {}", window.0);
        self.shell.forget(window.0);
        Ok(())
    }
}
