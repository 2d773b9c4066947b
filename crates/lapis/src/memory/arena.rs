use crate::error::{RegionError, Result};
use crate::size::SizeDescriptor;

use super::Regions;

/// Bump allocator carving object regions out of one caller buffer.
///
/// Nothing is ever freed individually; drop the arena (and reuse the buffer) once
/// every object carved from it has been released.
#[derive(Debug)]
pub struct Arena<'a> {
    rest: &'a mut [u8],
    used: usize,
}

impl<'a> Arena<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { rest: buffer, used: 0 }
    }

    /// Bytes handed out so far, including alignment padding.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    /// Carves a block of `len` bytes aligned to `align`.
    ///
    /// Returns `None`, leaving the arena untouched, when the block does not fit
    /// or `align` is not a power of two.
    pub fn take(&mut self, len: usize, align: usize) -> Option<&'a mut [u8]> {
        if !align.is_power_of_two() {
            return None;
        }
        let pad = self.padding_at(0, align);
        let needed = pad.checked_add(len)?;
        if needed > self.rest.len() {
            return None;
        }
        Some(self.carve(pad, len))
    }

    /// Carves host and device regions for one object.
    ///
    /// Both blocks are fitted before either is taken, so a failed call leaves
    /// the arena as it was.
    pub fn regions(&mut self, size: &SizeDescriptor) -> Result<Regions<'a>> {
        super::check_alignment(size.device_alignment)?;

        let pad = self.padding_at(size.host_bytes, size.device_alignment);
        let required = size
            .host_bytes
            .checked_add(pad)
            .and_then(|n| n.checked_add(size.device_bytes));
        let remaining = self.remaining();
        if !required.is_some_and(|required| required <= remaining) {
            return Err(RegionError::ArenaExhausted {
                required: required.unwrap_or(usize::MAX),
                remaining,
            }
            .into());
        }

        let host = self.carve(0, size.host_bytes);
        let device = self.carve(pad, size.device_bytes);
        host.fill(0);
        device.fill(0);
        Ok(Regions::new(host, device))
    }

    /// Padding needed for a block starting `offset` bytes into the free space.
    #[inline]
    fn padding_at(&self, offset: usize, align: usize) -> usize {
        super::padding((self.rest.as_ptr() as usize).wrapping_add(offset), align)
    }

    /// Splits off `pad` bytes then a `len` block. The caller has checked the fit.
    fn carve(&mut self, pad: usize, len: usize) -> &'a mut [u8] {
        let rest = core::mem::take(&mut self.rest);
        let (_, tail) = rest.split_at_mut(pad);
        let (block, tail) = tail.split_at_mut(len);
        self.rest = tail;
        self.used += pad + len;
        block
    }
}
