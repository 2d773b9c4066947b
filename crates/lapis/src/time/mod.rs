//! Frame pacing.
//!
//! Models the vertical-sync boundary for backends that have no display to block
//! on. One `VsyncClock` per display, `wait()` once per presented frame.

mod vsync;

pub use vsync::{FrameTime, VsyncClock};
