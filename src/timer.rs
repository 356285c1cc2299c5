//! Delay and sound timers.
//!
//! Both timers are 8-bit counters decremented at a fixed 60 Hz cadence,
//! independent of how fast instructions execute. They saturate at zero.

/// Result of a single timer decrement, used to edge-trigger the sound
/// capability without tracking extra state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// Counter is still running
    On,
    /// Counter was already at zero
    Off,
    /// Counter reached zero on this decrement
    Finished,
}

#[derive(Debug)]
pub struct Timer(u8);

impl Timer {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn store(&mut self, value: u8) {
        self.0 = value;
    }

    #[inline]
    pub fn load(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn decrement(&mut self) -> TimerState {
        if self.0 > 0 {
            self.0 -= 1;
            if self.0 == 0 {
                TimerState::Finished
            } else {
                TimerState::On
            }
        } else {
            TimerState::Off
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
