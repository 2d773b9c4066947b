use std::time::{Duration, Instant};

/// Presentation timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous presentation, in seconds.
    pub dt: f32,

    /// Monotonic timestamp of this presentation.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Simulated vertical-sync clock.
///
/// `wait()` blocks the calling thread until the next vblank boundary. Boundaries
/// that were missed (the caller took longer than one interval) are skipped rather
/// than replayed, so a slow frame never causes a burst of unthrottled ones.
///
/// With no interval the clock never blocks, which is what tests want.
#[derive(Debug, Clone)]
pub struct VsyncClock {
    interval: Option<Duration>,
    last: Instant,
    next_vblank: Instant,
    frame_index: u64,
}

impl VsyncClock {
    pub fn new(interval: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last: now,
            next_vblank: now + interval.unwrap_or_default(),
            frame_index: 0,
        }
    }

    /// A clock ticking at `hz` vblanks per second.
    pub fn with_refresh_rate(hz: u32) -> Self {
        debug_assert!(hz > 0);
        Self::new(Some(Duration::from_secs(1) / hz.max(1)))
    }

    #[inline]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Re-anchors the vblank grid at the current instant.
    ///
    /// Useful after a window is reopened or the process resumes from suspension.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last = now;
        self.next_vblank = now + self.interval.unwrap_or_default();
    }

    /// Blocks until the next vblank and returns its timing.
    pub fn wait(&mut self) -> FrameTime {
        if let Some(interval) = self.interval {
            let now = Instant::now();
            if now < self.next_vblank {
                std::thread::sleep(self.next_vblank - now);
            }

            let now = Instant::now();
            self.next_vblank += interval;
            if self.next_vblank <= now {
                // Missed one or more boundaries; realign to the grid.
                let behind = now.saturating_duration_since(self.next_vblank);
                let skipped = (behind.as_nanos() / interval.as_nanos().max(1)) as u32 + 1;
                self.next_vblank += interval * skipped;
            }
        }

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for VsyncClock {
    fn default() -> Self {
        Self::with_refresh_rate(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unthrottled_clock_counts_frames() {
        let mut clock = VsyncClock::new(None);
        let a = clock.wait();
        let b = clock.wait();
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!(b.now >= a.now);
    }

    #[test]
    fn throttled_clock_blocks_until_boundary() {
        let interval = Duration::from_millis(5);
        let mut clock = VsyncClock::new(Some(interval));
        let start = Instant::now();
        clock.wait();
        clock.wait();
        assert!(start.elapsed() >= interval * 2);
    }

    #[test]
    fn missed_boundaries_are_skipped() {
        let interval = Duration::from_millis(2);
        let mut clock = VsyncClock::new(Some(interval));
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(10));
        clock.wait();
        // The next boundary lies past the stall, not in a backlog of missed ones.
        assert!(clock.next_vblank > start + Duration::from_millis(10));
    }

    #[test]
    fn refresh_rate_sets_interval() {
        let clock = VsyncClock::with_refresh_rate(50);
        assert_eq!(clock.interval(), Some(Duration::from_millis(20)));
    }
}
