//! Host-region record layout.
//!
//! Every host region starts with a `Header`. Records are `Pod` and always copied
//! in and out unaligned, so callers only owe alignment for device memory.

use core::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::kind::ObjectKind;

/// Written last by a successful construct.
pub(crate) const LIVE: u32 = 0x4C41_5049; // "LAPI"

/// Written by release.
pub(crate) const RELEASED: u32 = 0xDEAD_0B1E;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct Header {
    pub sentinel: u32,
    pub kind: u32,
    /// Connection-unique object id. Never zero once constructed.
    pub id: u32,
    /// Id of the owning object, zero when there is none.
    pub owner: u32,
}

impl Header {
    pub(crate) fn live(kind: ObjectKind, id: u32, owner: u32) -> Self {
        Self {
            sentinel: LIVE,
            kind: kind.raw(),
            id,
            owner,
        }
    }

    #[inline]
    pub(crate) fn is_live(&self, kind: ObjectKind) -> bool {
        self.sentinel == LIVE && self.kind == kind.raw()
    }
}

/// A record stored at the start of a host region.
pub(crate) trait HostRecord: Pod {
    const KIND: ObjectKind;

    fn header(&self) -> &Header;
}

#[inline]
pub(crate) fn load<T: Pod>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(&bytes[..size_of::<T>()])
}

#[inline]
pub(crate) fn store<T: Pod>(bytes: &mut [u8], value: &T) {
    bytes[..size_of::<T>()].copy_from_slice(bytemuck::bytes_of(value));
}

/// Loads a record, asserting in debug builds that it was constructed and not
/// yet released.
///
/// Release builds perform no check; operating on an unconstructed or released
/// object is a caller error with an unspecified outcome.
#[inline]
pub(crate) fn load_live<T: HostRecord>(bytes: &[u8]) -> T {
    let record: T = load(bytes);
    debug_assert!(
        record.header().is_live(T::KIND),
        "{} used before construction or after release (sentinel {:#010x}, kind tag {})",
        T::KIND,
        record.header().sentinel,
        record.header().kind,
    );
    record
}

/// Marks a host region as released.
pub(crate) fn mark_released(bytes: &mut [u8]) {
    let mut header: Header = load(bytes);
    header.sentinel = RELEASED;
    store(bytes, &header);
}
