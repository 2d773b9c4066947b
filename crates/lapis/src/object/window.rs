use bytemuck::{Pod, Zeroable};

use crate::backend::{WindowEvent, WindowSlot};
use crate::kind::ObjectKind;
use crate::memory::Regions;
use crate::memory::layout::{Header, HostRecord};
use crate::size::{BYTES_PER_PIXEL, WINDOW_BUFFERS};

use super::Target;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct WindowHost {
    /// `owner` is the context id.
    pub header: Header,
    pub slot: u32,
    pub width: u32,
    pub height: u32,
    /// Index (0 or 1) of the framebuffer last presented.
    pub front: u32,
    pub open: u32,
    pub focused: u32,
    pub pointer_x: f32,
    pub pointer_y: f32,
    /// Last size reported by the window system, zero until the first resize.
    pub requested_width: u32,
    pub requested_height: u32,
    pub frame_index: u32,
}

impl HostRecord for WindowHost {
    const KIND: ObjectKind = ObjectKind::Window;

    fn header(&self) -> &Header {
        &self.header
    }
}

impl WindowHost {
    fn apply(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.open = 0,
            WindowEvent::Resized { width, height } => {
                self.requested_width = width;
                self.requested_height = height;
            }
            WindowEvent::Focused(focused) => self.focused = focused as u32,
            WindowEvent::PointerMoved { x, y } => {
                self.pointer_x = x;
                self.pointer_y = y;
            }
        }
    }

    #[inline]
    fn buffer_bytes(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    fn buffer_range(&self, index: u32) -> core::ops::Range<usize> {
        let len = self.buffer_bytes();
        let start = index as usize * len;
        start..start + len
    }
}

/// A presentable surface with a front and a back RGBA8 framebuffer.
///
/// Targets owned by the window are composed into the back buffer at swap time;
/// the front buffer always holds the image last handed to the display.
#[derive(Debug)]
pub struct Window<'m> {
    regions: Regions<'m>,
}

impl<'m> Window<'m> {
    /// Regions must already have been checked against the window descriptor.
    pub(crate) fn construct(
        mut regions: Regions<'m>,
        id: u32,
        context: u32,
        slot: WindowSlot,
        (width, height): (u32, u32),
    ) -> Self {
        let record = WindowHost {
            header: Header::live(ObjectKind::Window, id, context),
            slot: slot.0,
            width,
            height,
            front: 0,
            open: 1,
            focused: 0,
            pointer_x: 0.0,
            pointer_y: 0.0,
            requested_width: 0,
            requested_height: 0,
            frame_index: 0,
        };

        let both = record.buffer_bytes() * WINDOW_BUFFERS;
        regions.device_mut()[..both].fill(0);
        super::write(&mut regions, &record);
        Self { regions }
    }

    /// Rewraps regions that already hold a constructed, unreleased window.
    ///
    /// Passing anything else is a caller error. Debug builds detect it and panic.
    pub fn from_constructed(regions: Regions<'m>) -> Self {
        let _: WindowHost = super::record(&regions);
        Self { regions }
    }

    /// Framebuffer size in pixels.
    pub fn size(&self) -> (u32, u32) {
        let r = self.record();
        (r.width, r.height)
    }

    /// `false` once the window system asked for the window to close.
    pub fn is_open(&self) -> bool {
        self.record().open != 0
    }

    pub fn is_focused(&self) -> bool {
        self.record().focused != 0
    }

    /// Last pointer position in window pixels, top-left origin.
    pub fn pointer_position(&self) -> (f32, f32) {
        let r = self.record();
        (r.pointer_x, r.pointer_y)
    }

    /// Latest platform window size, if the window system reported one.
    ///
    /// The framebuffer keeps its constructed size; recreate the window to follow it.
    pub fn requested_size(&self) -> Option<(u32, u32)> {
        let r = self.record();
        (r.requested_width != 0 && r.requested_height != 0)
            .then_some((r.requested_width, r.requested_height))
    }

    /// Number of frames presented so far.
    pub fn frame_index(&self) -> u32 {
        self.record().frame_index
    }

    /// The image last presented, RGBA8, row-major, top row first.
    pub fn front_buffer(&self) -> &[u8] {
        let r = self.record();
        &self.regions.device()[r.buffer_range(r.front)]
    }

    pub(crate) fn id(&self) -> u32 {
        self.record().header.id
    }

    pub(crate) fn context(&self) -> u32 {
        self.record().header.owner
    }

    /// Backend slot, for scripting events on headless backends.
    pub fn slot(&self) -> WindowSlot {
        WindowSlot(self.record().slot)
    }

    pub(crate) fn apply_event(&mut self, event: WindowEvent) {
        let mut r = self.record();
        r.apply(event);
        super::write(&mut self.regions, &r);
    }

    /// Copies `target` into the back buffer at the top-left corner, clipped to
    /// the window.
    pub(crate) fn compose(&mut self, target: &Target<'_>) {
        let r = self.record();
        let (tw, th) = target.size();
        let cols = tw.min(r.width) as usize * BYTES_PER_PIXEL;
        let rows = th.min(r.height) as usize;
        let src_stride = tw as usize * BYTES_PER_PIXEL;
        let dst_stride = r.width as usize * BYTES_PER_PIXEL;

        let back = &mut self.regions.device_mut()[r.buffer_range(1 - r.front)];
        let src = target.pixels();
        for row in 0..rows {
            let s = row * src_stride;
            let d = row * dst_stride;
            back[d..d + cols].copy_from_slice(&src[s..s + cols]);
        }
    }

    /// The back buffer as it will be presented, plus the frame index it carries.
    pub(crate) fn back_buffer(&self) -> (&[u8], u32) {
        let r = self.record();
        (&self.regions.device()[r.buffer_range(1 - r.front)], r.frame_index)
    }

    /// Makes the back buffer the new front and seeds the new back buffer with it,
    /// so the next partial refresh composes over the latest image.
    pub(crate) fn flip(&mut self) -> u32 {
        let mut r = self.record();
        r.front = 1 - r.front;
        let front = r.buffer_range(r.front);
        let back = r.buffer_range(1 - r.front);
        self.regions.device_mut().copy_within(front, back.start);

        r.frame_index = r.frame_index.wrapping_add(1);
        super::write(&mut self.regions, &r);
        r.frame_index
    }

    fn record(&self) -> WindowHost {
        super::record(&self.regions)
    }

    pub(crate) fn release(self) -> Regions<'m> {
        super::release::<WindowHost>(self.regions)
    }
}
