use bytemuck::{Pod, Zeroable};

use crate::kind::ObjectKind;
use crate::memory::Regions;
use crate::memory::layout::{Header, HostRecord};
use crate::raster::Canvas;
use crate::schedule::{Schedule, TargetState};
use crate::size::BYTES_PER_PIXEL;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct TargetHost {
    /// `owner` is the window id, zero for offscreen targets.
    pub header: Header,
    pub width: u32,
    pub height: u32,
    pub schedule: u32,
    /// Swaps that refreshed this target.
    pub refresh_count: u32,
}

impl HostRecord for TargetHost {
    const KIND: ObjectKind = ObjectKind::Target;

    fn header(&self) -> &Header {
        &self.header
    }
}

/// An RGBA8 area that can be cleared and drawn to.
#[derive(Debug)]
pub struct Target<'m> {
    regions: Regions<'m>,
}

impl<'m> Target<'m> {
    /// Regions must already have been checked against the target descriptor.
    pub(crate) fn construct(
        mut regions: Regions<'m>,
        id: u32,
        window: u32,
        (width, height): (u32, u32),
    ) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        regions.device_mut()[..len].fill(0);

        let record = TargetHost {
            header: Header::live(ObjectKind::Target, id, window),
            width,
            height,
            schedule: Schedule::initial().bits(),
            refresh_count: 0,
        };
        super::write(&mut regions, &record);
        Self { regions }
    }

    /// Rewraps regions that already hold a constructed, unreleased target.
    ///
    /// Passing anything else is a caller error. Debug builds detect it and panic.
    pub fn from_constructed(regions: Regions<'m>) -> Self {
        let _: TargetHost = super::record(&regions);
        Self { regions }
    }

    pub fn size(&self) -> (u32, u32) {
        let r = self.record();
        (r.width, r.height)
    }

    pub fn state(&self) -> TargetState {
        Schedule::from_bits(self.record().schedule).state()
    }

    /// Whether the target will be considered at the next swap of its window.
    pub fn is_scheduled(&self) -> bool {
        Schedule::from_bits(self.record().schedule).is_scheduled()
    }

    /// Number of swaps that presented new contents of this target.
    pub fn refresh_count(&self) -> u32 {
        self.record().refresh_count
    }

    /// Constructed without a window; never presented.
    pub fn is_offscreen(&self) -> bool {
        self.record().header.owner == 0
    }

    /// Color buffer contents, RGBA8, row-major, top row first.
    pub fn pixels(&self) -> &[u8] {
        let (w, h) = self.size();
        &self.regions.device()[..w as usize * h as usize * BYTES_PER_PIXEL]
    }

    pub(crate) fn owner(&self) -> u32 {
        self.record().header.owner
    }

    /// Marks the target dirty and hands out a canvas over its color buffer.
    pub(crate) fn canvas(&mut self) -> Canvas<'_> {
        self.update(Schedule::touch);
        let (width, height) = self.size();
        Canvas::new(self.regions.device_mut(), width, height)
    }

    pub(crate) fn schedule(&mut self) {
        self.update(Schedule::schedule);
    }

    /// Consumes the schedule at a swap; `true` when the target must be presented.
    pub(crate) fn take_refresh(&mut self) -> bool {
        let refresh = self.update(Schedule::take_refresh);
        if refresh {
            let mut r = self.record();
            r.refresh_count = r.refresh_count.wrapping_add(1);
            super::write(&mut self.regions, &r);
        }
        refresh
    }

    fn update<R>(&mut self, f: impl FnOnce(&mut Schedule) -> R) -> R {
        let mut r = self.record();
        let mut schedule = Schedule::from_bits(r.schedule);
        let out = f(&mut schedule);
        r.schedule = schedule.bits();
        super::write(&mut self.regions, &r);
        out
    }

    fn record(&self) -> TargetHost {
        super::record(&self.regions)
    }

    pub(crate) fn release(self) -> Regions<'m> {
        super::release::<TargetHost>(self.regions)
    }
}
