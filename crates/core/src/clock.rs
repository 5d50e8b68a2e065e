//! Round clock - a pausable countdown driven by host-supplied deltas
//!
//! The clock never reads wall time. The host loop feeds elapsed milliseconds
//! through [`RoundClock::advance`]; while paused those deltas are discarded.

use arrayvec::ArrayString;
use std::fmt::Write;

use crate::types::TIMER_LIMIT;

/// Countdown for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundClock {
    limit_ms: u32,
    elapsed_ms: u32,
    paused: bool,
}

impl RoundClock {
    pub fn new(limit_ms: u32) -> Self {
        Self {
            limit_ms,
            elapsed_ms: 0,
            paused: false,
        }
    }

    pub fn limit_ms(&self) -> u32 {
        self.limit_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u32 {
        self.limit_ms.saturating_sub(self.elapsed_ms)
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed_ms >= self.limit_ms
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advance by `ms` unless paused. Returns whether time moved.
    pub fn advance(&mut self, ms: u32) -> bool {
        if self.paused {
            return false;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms).min(self.limit_ms);
        true
    }

    /// Restart the countdown, unpaused.
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.paused = false;
    }
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new(TIMER_LIMIT * 1000)
    }
}

/// Render remaining time as `MM:SS`, counting partial seconds as whole ones.
///
/// ```
/// use tui_tilematch_core::clock::format_clock;
///
/// assert_eq!(format_clock(180_000).as_str(), "03:00");
/// assert_eq!(format_clock(59_001).as_str(), "01:00");
/// assert_eq!(format_clock(0).as_str(), "00:00");
/// ```
pub fn format_clock(remaining_ms: u32) -> ArrayString<12> {
    let secs = remaining_ms.div_ceil(1000);
    let mut out = ArrayString::new();
    // 12 bytes fit any u32 minute count plus ":SS".
    let _ = write!(out, "{:02}:{:02}", secs / 60, secs % 60);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_expires_at_limit() {
        let mut clock = RoundClock::new(1_000);
        clock.advance(600);
        assert_eq!(clock.remaining_ms(), 400);
        assert!(!clock.is_expired());
        clock.advance(600);
        assert_eq!(clock.remaining_ms(), 0);
        assert!(clock.is_expired());
        assert_eq!(clock.elapsed_ms(), 1_000);
    }

    #[test]
    fn test_paused_clock_ignores_deltas() {
        let mut clock = RoundClock::new(1_000);
        clock.set_paused(true);
        assert!(!clock.advance(5_000));
        assert_eq!(clock.remaining_ms(), 1_000);

        clock.set_paused(false);
        assert!(clock.advance(16));
        assert_eq!(clock.remaining_ms(), 984);
    }

    #[test]
    fn test_reset_unpauses() {
        let mut clock = RoundClock::default();
        clock.advance(10_000);
        clock.set_paused(true);
        clock.reset();
        assert_eq!(clock.remaining_ms(), TIMER_LIMIT * 1000);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(180_000).as_str(), "03:00");
        assert_eq!(format_clock(179_999).as_str(), "03:00");
        assert_eq!(format_clock(179_000).as_str(), "02:59");
        assert_eq!(format_clock(1).as_str(), "00:01");
        assert_eq!(format_clock(6_000_000).as_str(), "100:00");
    }
}
