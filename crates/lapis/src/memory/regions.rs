use crate::error::{RegionError, Result};
use crate::size::SizeDescriptor;

/// A pair of caller-owned memory regions backing one object.
///
/// The object itself is never a Rust value the caller can see: its layout inside
/// these bytes is private to lapis. Releasing an object hands the regions back so
/// the caller can free them.
#[derive(Debug)]
pub struct Regions<'m> {
    host: &'m mut [u8],
    device: &'m mut [u8],
}

impl<'m> Regions<'m> {
    #[inline]
    pub fn new(host: &'m mut [u8], device: &'m mut [u8]) -> Self {
        Self { host, device }
    }

    #[inline]
    pub fn host_len(&self) -> usize {
        self.host.len()
    }

    #[inline]
    pub fn device_len(&self) -> usize {
        self.device.len()
    }

    /// Whether these regions are large and aligned enough for `size`.
    pub fn satisfies(&self, size: &SizeDescriptor) -> bool {
        self.check(size).is_ok()
    }

    pub(crate) fn check(&self, size: &SizeDescriptor) -> Result<()> {
        super::check_alignment(size.device_alignment)?;
        if self.host.len() < size.host_bytes {
            return Err(RegionError::TooSmall {
                region: "host",
                required: size.host_bytes,
                actual: self.host.len(),
            }
            .into());
        }
        if self.device.len() < size.device_bytes {
            return Err(RegionError::TooSmall {
                region: "device",
                required: size.device_bytes,
                actual: self.device.len(),
            }
            .into());
        }
        if super::padding(self.device.as_ptr() as usize, size.device_alignment) != 0 {
            return Err(RegionError::Misaligned {
                alignment: size.device_alignment,
            }
            .into());
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn host(&self) -> &[u8] {
        &*self.host
    }

    #[inline]
    pub(crate) fn host_mut(&mut self) -> &mut [u8] {
        &mut *self.host
    }

    #[inline]
    pub(crate) fn device(&self) -> &[u8] {
        &*self.device
    }

    #[inline]
    pub(crate) fn device_mut(&mut self) -> &mut [u8] {
        &mut *self.device
    }

    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&mut [u8], &mut [u8]) {
        (&mut *self.host, &mut *self.device)
    }

    /// Splits back into the raw host and device slices.
    #[inline]
    pub fn into_parts(self) -> (&'m mut [u8], &'m mut [u8]) {
        (self.host, self.device)
    }
}
