//! Power key sequencing.
//!
//! The power key is driven through a table of durations. Even steps hold the
//! line at its active level, odd steps at the inactive level, and a zero
//! duration ends the table. The default table pulses the key twice so the
//! modem ends up powered on whatever state it started in.

use crate::system::{PinLevel, Platform};

/// Entries in the power step table
pub const POWER_STEPS: usize = 5;

/// Default step durations in milliseconds
pub const DEFAULT_POWER_STEPS_MS: [u32; POWER_STEPS] = [1500, 2000, 1500, 10000, 0];

/// Step to restart from when the modem stayed silent during the previous
/// session: a single toggle instead of the full off/on cycle.
pub const SILENT_RESTART_STEP: usize = 2;

/// Walks the power step table.
#[derive(Debug, Clone)]
pub struct PowerSequencer {
    steps_ms: [u32; POWER_STEPS],
    active: PinLevel,
    step: usize,
    started_ms: u64,
    running: bool,
}

impl PowerSequencer {
    /// Sequencer over `steps_ms`, with the key active high or low.
    pub fn new(steps_ms: [u32; POWER_STEPS], active_high: bool) -> Self {
        Self {
            steps_ms,
            active: if active_high { PinLevel::High } else { PinLevel::Low },
            step: 0,
            started_ms: 0,
            running: false,
        }
    }

    fn duration(&self, step: usize) -> u32 {
        self.steps_ms.get(step).copied().unwrap_or(0)
    }

    fn level(&self, step: usize) -> PinLevel {
        if step % 2 == 0 {
            self.active
        } else {
            self.active.inverted()
        }
    }

    fn enter<P: Platform>(&mut self, platform: &mut P, step: usize) -> bool {
        self.step = step;
        if self.duration(step) == 0 {
            self.running = false;
            platform.release_power_key();
            debug!("power sequence done at step {}", step);
            return false;
        }
        let level = self.level(step);
        debug!(
            "power step {}, level {} for {} ms",
            step,
            level,
            self.duration(step)
        );
        platform.set_power_key(level);
        self.started_ms = platform.now_ms();
        self.running = true;
        true
    }

    /// Start at `first_step`. Returns `false` when there is nothing to do and
    /// the transport can be opened right away.
    pub fn start<P: Platform>(&mut self, platform: &mut P, first_step: usize) -> bool {
        self.enter(platform, first_step)
    }

    /// Advance if the current step has elapsed. Returns `true` once the
    /// sequence has just completed.
    pub fn poll<P: Platform>(&mut self, platform: &mut P) -> bool {
        if !self.running {
            return false;
        }
        let elapsed = platform.now_ms().saturating_sub(self.started_ms);
        if elapsed < self.duration(self.step) as u64 {
            return false;
        }
        !self.enter(platform, self.step + 1)
    }

    /// True while steps remain
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current step index
    pub fn step(&self) -> usize {
        self.step
    }
}
