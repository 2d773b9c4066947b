use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{StartCause, WindowEvent as WinitEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Fullscreen, Window, WindowId};

use crate::backend::WindowEvent;

/// Window creation deferred until the event loop hands out an `ActiveEventLoop`.
struct WindowRequest {
    slot: u32,
    width: u32,
    height: u32,
}

/// Event-loop side of the windowed backend.
///
/// winit only creates windows and reports monitors from inside its callbacks,
/// so requests are buffered here and serviced on the next pump, the same way
/// runtime commands are applied after a callback returns.
pub(super) struct Shell {
    title: String,
    fullscreen: bool,

    resumed: bool,
    monitor: Option<PhysicalSize<u32>>,

    pending: Vec<WindowRequest>,
    opened: Vec<(u32, Result<Arc<Window>, String>)>,

    slots: HashMap<WindowId, u32>,
    /// Translated events per slot, drained by `poll_events`.
    events: Vec<VecDeque<WindowEvent>>,
}

impl Shell {
    pub(super) fn new(title: String, fullscreen: bool) -> Self {
        Self {
            title,
            fullscreen,
            resumed: false,
            monitor: None,
            pending: Vec::new(),
            opened: Vec::new(),
            slots: HashMap::new(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub(super) fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// Primary monitor size, once the event loop reported one.
    #[inline]
    pub(super) fn monitor(&self) -> Option<PhysicalSize<u32>> {
        self.monitor
    }

    pub(super) fn request_window(&mut self, slot: u32, width: u32, height: u32) {
        self.pending.push(WindowRequest { slot, width, height });
    }

    /// The creation result for `slot`, once serviced.
    pub(super) fn take_opened(&mut self, slot: u32) -> Option<Result<Arc<Window>, String>> {
        let index = self.opened.iter().position(|(s, _)| *s == slot)?;
        Some(self.opened.swap_remove(index).1)
    }

    pub(super) fn drain_events(&mut self, slot: u32, mut sink: impl FnMut(WindowEvent)) {
        if let Some(queue) = self.events.get_mut(slot as usize) {
            queue.drain(..).for_each(&mut sink);
        }
    }

    pub(super) fn forget(&mut self, slot: u32) {
        self.slots.retain(|_, s| *s != slot);
        if let Some(queue) = self.events.get_mut(slot as usize) {
            queue.clear();
        }
    }

    fn service(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);

        if self.monitor.is_none() {
            self.monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .map(|m| m.size())
                .filter(|size| size.width > 0 && size.height > 0);
        }

        for request in std::mem::take(&mut self.pending) {
            let mut attrs = Window::default_attributes().with_title(self.title.clone());
            attrs = if self.fullscreen {
                attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
            } else {
                attrs
                    .with_inner_size(PhysicalSize::new(request.width, request.height))
                    .with_resizable(false)
            };

            let result = event_loop
                .create_window(attrs)
                .map(Arc::new)
                .map_err(|e| e.to_string());

            if let Ok(window) = &result {
                self.slots.insert(window.id(), request.slot);
                let index = request.slot as usize;
                if self.events.len() <= index {
                    self.events.resize_with(index + 1, VecDeque::new);
                }
            }
            self.opened.push((request.slot, result));
        }
    }
}

impl ApplicationHandler for Shell {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: StartCause) {
        if self.resumed {
            self.service(event_loop);
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.resumed = true;
        self.service(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.resumed {
            self.service(event_loop);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WinitEvent) {
        let Some(&slot) = self.slots.get(&window_id) else {
            return;
        };

        let Some(event) = translate(event) else {
            return;
        };
        if let Some(queue) = self.events.get_mut(slot as usize) {
            queue.push_back(event);
        }
    }
}

fn translate(event: WinitEvent) -> Option<WindowEvent> {
    match event {
        WinitEvent::CloseRequested => Some(WindowEvent::CloseRequested),
        WinitEvent::Resized(size) => Some(WindowEvent::Resized {
            width: size.width,
            height: size.height,
        }),
        WinitEvent::Focused(focused) => Some(WindowEvent::Focused(focused)),
        WinitEvent::CursorMoved { position, .. } => Some(WindowEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        _ => None,
    }
}
