use crate::error::{Result, Unsupported};
use crate::size::SizeDescriptor;

use super::Regions;

/// Default allocator: owns zeroed host and device buffers for one object.
///
/// The device buffer is over-allocated by `device_alignment - 1` bytes and the
/// usable window starts at the first aligned address. Freeing is dropping.
///
/// ```ignore
/// let size = lapis.query_size(ObjectKind::Context, None)?;
/// let mut memory = Allocation::new(&size)?;
/// let context = lapis.construct_context(memory.regions())?;
/// ```
#[derive(Debug)]
pub struct Allocation {
    host: Vec<u8>,
    device: Vec<u8>,
    device_offset: usize,
    size: SizeDescriptor,
}

impl Allocation {
    /// Fails when `device_alignment` is not a power of two.
    pub fn new(size: &SizeDescriptor) -> Result<Self> {
        super::check_alignment(size.device_alignment)?;

        let padded = size
            .device_bytes
            .checked_add(size.device_alignment.saturating_sub(1))
            .ok_or(Unsupported::SizeOverflow { width: 0, height: 0 })?;

        let host = vec![0u8; size.host_bytes];
        let device = vec![0u8; padded];

        let device_offset = super::padding(device.as_ptr() as usize, size.device_alignment);

        Ok(Self {
            host,
            device,
            device_offset,
            size: *size,
        })
    }

    /// The descriptor this allocation was made for.
    #[inline]
    pub fn size(&self) -> SizeDescriptor {
        self.size
    }

    /// Borrows the regions for construction.
    pub fn regions(&mut self) -> Regions<'_> {
        let start = self.device_offset;
        let end = start + self.size.device_bytes;
        Regions::new(&mut self.host[..], &mut self.device[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LapisError, RegionError};

    #[test]
    fn regions_meet_the_descriptor() {
        for align in [1, 8, 64, 256, 4096] {
            let size = SizeDescriptor {
                host_bytes: 40,
                device_bytes: 1000,
                device_alignment: align,
            };
            let mut alloc = Allocation::new(&size).unwrap();
            let regions = alloc.regions();
            assert!(regions.satisfies(&size), "alignment {align}");
            assert_eq!(regions.host_len(), 40);
            assert_eq!(regions.device_len(), 1000);
        }
    }

    #[test]
    fn memory_starts_zeroed() {
        let size = SizeDescriptor {
            host_bytes: 16,
            device_bytes: 64,
            device_alignment: 16,
        };
        let mut alloc = Allocation::new(&size).unwrap();
        let (host, device) = alloc.regions().into_parts();
        assert!(host.iter().all(|&b| b == 0));
        assert!(device.iter().all(|&b| b == 0));
    }

    #[test]
    fn bad_alignment_is_an_error() {
        for alignment in [0, 3] {
            let size = SizeDescriptor {
                host_bytes: 8,
                device_bytes: 64,
                device_alignment: alignment,
            };
            assert_eq!(
                Allocation::new(&size).unwrap_err(),
                LapisError::InvalidRegion(RegionError::BadAlignment { alignment })
            );
        }
    }

    #[test]
    fn zero_sized_device_region_is_fine() {
        let size = SizeDescriptor {
            host_bytes: 8,
            device_bytes: 0,
            device_alignment: 64,
        };
        let mut alloc = Allocation::new(&size).unwrap();
        assert_eq!(alloc.regions().device_len(), 0);
    }
}
