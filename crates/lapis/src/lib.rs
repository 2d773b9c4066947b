//! Lapis: a zero-allocation rendering abstraction.
//!
//! Objects (contexts, windows, render targets) live in memory the caller
//! allocates. The caller asks how much host and device memory an object needs,
//! allocates it with any allocator, constructs the object into it, drives it
//! through per-frame calls and finally releases it to get the memory back.
//!
//! ```ignore
//! let mut lapis = Lapis::new(HeadlessBackend::<DesktopProfile>::default());
//! lapis.connect()?;
//!
//! let mut memory = Allocation::new(&lapis.query_size(ObjectKind::Context, None)?)?;
//! let context = lapis.construct_context(memory.regions())?;
//! ```
//!
//! Everything goes through an explicit `Lapis` connection; several connections
//! with different backends can coexist in one process.

pub mod backend;
pub mod caps;
pub mod draw;
pub mod error;
pub mod kind;
pub mod logging;
pub mod memory;
pub mod object;
pub mod raster;
pub mod schedule;
pub mod size;
pub mod time;

mod lapis;

pub use backend::{Backend, DisplayInfo, WindowEvent, WindowSlot};
pub use caps::{DrawFeatures, MeshFeatures};
pub use draw::ImmediateDraw;
pub use error::{LapisError, Result};
pub use kind::ObjectKind;
pub use lapis::{Lapis, SwapInfo};
pub use memory::{Allocation, Arena, Regions};
pub use object::{Context, Target, Window};
pub use raster::Rgb;
pub use schedule::TargetState;
pub use size::{SizeDescriptor, SizingHelper, TargetHelper, WindowHelper};
