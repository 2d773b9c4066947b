use bytemuck::{Pod, Zeroable};

use crate::backend::DisplayInfo;
use crate::kind::ObjectKind;
use crate::memory::Regions;
use crate::memory::layout::{Header, HostRecord};
use crate::size::BYTES_PER_PIXEL;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ContextHost {
    pub header: Header,
    pub display_width: u32,
    pub display_height: u32,
}

impl HostRecord for ContextHost {
    const KIND: ObjectKind = ObjectKind::Context;

    fn header(&self) -> &Header {
        &self.header
    }
}

/// Connection-wide root object. Windows are constructed against a context.
///
/// The device region reserves one display-sized scanout buffer.
#[derive(Debug)]
pub struct Context<'m> {
    regions: Regions<'m>,
}

impl<'m> Context<'m> {
    /// Regions must already have been checked against the context descriptor.
    pub(crate) fn construct(mut regions: Regions<'m>, id: u32, display: &DisplayInfo) -> Self {
        let scanout = display.width as usize * display.height as usize * BYTES_PER_PIXEL;
        regions.device_mut()[..scanout].fill(0);

        let record = ContextHost {
            header: Header::live(ObjectKind::Context, id, 0),
            display_width: display.width,
            display_height: display.height,
        };
        super::write(&mut regions, &record);
        Self { regions }
    }

    /// Rewraps regions that already hold a constructed, unreleased context.
    ///
    /// Passing anything else is a caller error. Debug builds detect it and panic.
    pub fn from_constructed(regions: Regions<'m>) -> Self {
        let _: ContextHost = super::record(&regions);
        Self { regions }
    }

    /// Display resolution captured when the context was constructed.
    pub fn display_size(&self) -> (u32, u32) {
        let r = self.record();
        (r.display_width, r.display_height)
    }

    pub(crate) fn id(&self) -> u32 {
        self.record().header.id
    }

    fn record(&self) -> ContextHost {
        super::record(&self.regions)
    }

    pub(crate) fn release(self) -> Regions<'m> {
        super::release::<ContextHost>(self.regions)
    }
}
