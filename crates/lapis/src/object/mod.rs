//! Objects constructed in caller memory.
//!
//! A handle borrows the `Regions` it was constructed into and is the only way
//! to reach the object. State lives in a `Pod` record at the start of the host
//! region; pixels live in the device region. Handles are never dropped
//! implicitly into a usable state: release them through `Lapis` to get the
//! regions back.

mod context;
mod target;
mod window;

pub use context::Context;
pub use target::Target;
pub use window::Window;

pub(crate) use context::ContextHost;
pub(crate) use target::TargetHost;
pub(crate) use window::WindowHost;

use crate::memory::Regions;
use crate::memory::layout::{self, HostRecord};

/// Reads the live record of `T` from `regions`.
#[inline]
fn record<T: HostRecord>(regions: &Regions<'_>) -> T {
    layout::load_live(regions.host())
}

#[inline]
fn write<T: HostRecord>(regions: &mut Regions<'_>, record: &T) {
    layout::store(regions.host_mut(), record);
}

/// Marks the host record released and hands the regions back.
fn release<'m, T: HostRecord>(mut regions: Regions<'m>) -> Regions<'m> {
    let _: T = record(&regions);
    layout::mark_released(regions.host_mut());
    regions
}
