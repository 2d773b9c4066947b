//! Caller-owned memory.
//!
//! Lapis never allocates for its objects. The caller asks the size registry how
//! much memory an object needs, allocates it however it likes and hands the
//! regions over for construction. `Allocation` and `Arena` are ready-made
//! allocators; any other allocator works as long as it produces `Regions`.

mod alloc;
mod arena;
pub(crate) mod layout;
mod regions;

pub use alloc::Allocation;
pub use arena::Arena;
pub use regions::Regions;

use crate::error::{RegionError, Result};

/// Rejects alignments the allocators cannot honor.
pub(crate) fn check_alignment(alignment: usize) -> Result<()> {
    if !alignment.is_power_of_two() {
        return Err(RegionError::BadAlignment { alignment }.into());
    }
    Ok(())
}

/// Padding that brings `addr` up to `align`, a power of two.
#[inline]
pub(crate) fn padding(addr: usize, align: usize) -> usize {
    addr.wrapping_neg() & (align - 1)
}
