//! Target refresh scheduling.
//!
//! Lapis does not re-present every target every frame. A text editor, for
//! example, wants to redraw the one glyph that changed, not the whole screen.
//! Drawing marks a target dirty; scheduling marks it for refresh at the next
//! swap of its window; the swap refreshes only targets that are both, then
//! returns them to `Clean`.

use bitflags::bitflags;

/// Whether a target's contents are ahead of what its window last presented.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TargetState {
    Clean,
    Dirty,
}

bitflags! {
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub(crate) struct ScheduleFlags: u32 {
        const DIRTY = 1 << 0;
        const SCHEDULED = 1 << 1;
    }
}

/// Scheduling state of one target, stored as raw bits in its host record.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Schedule(ScheduleFlags);

impl Schedule {
    /// Freshly constructed targets must be drawn once before their first present.
    #[inline]
    pub(crate) fn initial() -> Self {
        Self(ScheduleFlags::DIRTY)
    }

    #[inline]
    pub(crate) fn from_bits(bits: u32) -> Self {
        Self(ScheduleFlags::from_bits_truncate(bits))
    }

    #[inline]
    pub(crate) fn bits(self) -> u32 {
        self.0.bits()
    }

    #[inline]
    pub(crate) fn state(self) -> TargetState {
        if self.0.contains(ScheduleFlags::DIRTY) {
            TargetState::Dirty
        } else {
            TargetState::Clean
        }
    }

    #[inline]
    pub(crate) fn is_scheduled(self) -> bool {
        self.0.contains(ScheduleFlags::SCHEDULED)
    }

    /// Clear and draw calls. Re-entering `Dirty` is a no-op.
    #[inline]
    pub(crate) fn touch(&mut self) {
        self.0.insert(ScheduleFlags::DIRTY);
    }

    #[inline]
    pub(crate) fn schedule(&mut self) {
        self.0.insert(ScheduleFlags::SCHEDULED);
    }

    /// Consumes the schedule at a swap.
    ///
    /// Returns `true` when the target must be refreshed (dirty and scheduled), in
    /// which case it becomes `Clean`. The schedule request is consumed either way;
    /// a dirty target that was not scheduled stays dirty.
    #[inline]
    pub(crate) fn take_refresh(&mut self) -> bool {
        let refresh = self.0.contains(ScheduleFlags::DIRTY | ScheduleFlags::SCHEDULED);
        if refresh {
            self.0.remove(ScheduleFlags::DIRTY);
        }
        self.0.remove(ScheduleFlags::SCHEDULED);
        refresh
    }
}
