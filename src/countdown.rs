//! Per-item restock countdown.
//!
//! A `Countdown` owns at most one `Ticker`. The ticker is created when the
//! countdown is activated with a future restock time and dropped when the
//! countdown expires, is re-targeted, or the owning row goes away, so a row
//! can never leak a schedule.

use std::time::Duration;

/// How often an active countdown recomputes its remaining time.
pub const TICK_MS: i64 = 250;

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `mm:ss` with floored seconds; anything at or below zero is "0:00".
pub fn format_countdown(ms: i64) -> String {
    if ms <= 0 {
        return "0:00".to_string();
    }
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

#[derive(Debug)]
struct Ticker {
    next_due: i64,
}

#[derive(Debug)]
pub struct Countdown {
    restock_time: i64,
    remaining: i64,
    ticker: Option<Ticker>,
}

impl Countdown {
    /// Create and immediately activate a countdown towards `restock_time`.
    pub fn start(restock_time: i64, now: i64) -> Self {
        let mut countdown = Self {
            restock_time,
            remaining: 0,
            ticker: None,
        };
        countdown.activate(now);
        countdown
    }

    fn activate(&mut self, now: i64) {
        // Releases any previous schedule before acquiring a new one
        self.ticker = None;

        if self.restock_time <= 0 {
            self.remaining = 0;
            return;
        }

        self.remaining = (self.restock_time - now).max(0);
        if self.remaining > 0 {
            self.ticker = Some(Ticker { next_due: now + TICK_MS });
        }
    }

    /// Point the countdown at a new restock time. A no-op when unchanged.
    pub fn retarget(&mut self, restock_time: i64, now: i64) {
        if restock_time != self.restock_time {
            self.restock_time = restock_time;
            self.activate(now);
        }
    }

    /// Recompute `remaining` if a tick is due. Returns true when it ticked.
    pub fn tick(&mut self, now: i64) -> bool {
        let Some(ticker) = self.ticker.as_mut() else {
            return false;
        };
        if now < ticker.next_due {
            return false;
        }

        // Skip missed ticks instead of bursting through them
        while ticker.next_due <= now {
            ticker.next_due += TICK_MS;
        }

        self.remaining = (self.restock_time - now).max(0);
        if self.remaining == 0 {
            // Expired is terminal for a fixed restock time
            self.ticker = None;
        }
        true
    }

    /// Time until the next scheduled tick, or `None` when nothing is scheduled.
    pub fn next_tick_in(&self, now: i64) -> Option<Duration> {
        self.ticker
            .as_ref()
            .map(|ticker| Duration::from_millis((ticker.next_due - now).max(0) as u64))
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.restock_time > 0
    }

    pub fn is_expired(&self) -> bool {
        self.restock_time > 0 && self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_countdown(65_000), "1:05");
        assert_eq!(format_countdown(65_999), "1:05");
        assert_eq!(format_countdown(9_000), "0:09");
        assert_eq!(format_countdown(600_000), "10:00");
        assert_eq!(format_countdown(3_725_000), "62:05");
    }

    #[test]
    fn non_positive_formats_as_zero() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(-1_500), "0:00");
        assert_eq!(format_countdown(999), "0:00");
    }

    #[test]
    fn inactive_without_restock_time() {
        for restock_time in [0, -1, -1_700_000_000_000] {
            let countdown = Countdown::start(restock_time, NOW);
            assert_eq!(countdown.remaining(), 0);
            assert!(!countdown.is_active());
            assert!(!countdown.is_expired());
            assert!(!countdown.is_ticking());
            assert_eq!(countdown.next_tick_in(NOW), None);
        }
    }

    #[test]
    fn shows_remaining_immediately_after_activation() {
        let countdown = Countdown::start(NOW + 65_000, NOW);
        assert_eq!(countdown.remaining(), 65_000);
        assert_eq!(format_countdown(countdown.remaining()), "1:05");
        assert!(!countdown.is_expired());
        assert_eq!(countdown.next_tick_in(NOW), Some(Duration::from_millis(250)));
    }

    #[test]
    fn past_restock_time_is_expired() {
        let countdown = Countdown::start(NOW - 10, NOW);
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.is_expired());
        assert!(!countdown.is_ticking());
    }

    #[test]
    fn ticks_every_quarter_second() {
        let mut countdown = Countdown::start(NOW + 2_000, NOW);

        assert!(!countdown.tick(NOW + 100));
        assert_eq!(countdown.remaining(), 2_000);

        assert!(countdown.tick(NOW + 250));
        assert_eq!(countdown.remaining(), 1_750);
        assert_eq!(countdown.next_tick_in(NOW + 250), Some(Duration::from_millis(250)));
    }

    #[test]
    fn late_frames_skip_missed_ticks() {
        let mut countdown = Countdown::start(NOW + 5_000, NOW);

        assert!(countdown.tick(NOW + 1_100));
        assert_eq!(countdown.remaining(), 3_900);
        // next due is the following quarter, not a burst of catch-up ticks
        assert_eq!(countdown.next_tick_in(NOW + 1_100), Some(Duration::from_millis(150)));
    }

    #[test]
    fn expires_and_releases_its_ticker() {
        let mut countdown = Countdown::start(NOW + 500, NOW);

        assert!(countdown.tick(NOW + 250));
        assert!(!countdown.is_expired());

        assert!(countdown.tick(NOW + 500));
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.is_expired());
        assert!(!countdown.is_ticking());
        assert!(!countdown.tick(NOW + 750));
    }

    #[test]
    fn retarget_restarts_the_schedule() {
        let mut countdown = Countdown::start(NOW - 1, NOW);
        assert!(countdown.is_expired());

        countdown.retarget(NOW + 61_000, NOW + 100);
        assert_eq!(countdown.remaining(), 60_900);
        assert!(countdown.is_ticking());
        assert_eq!(countdown.next_tick_in(NOW + 100), Some(Duration::from_millis(250)));

        countdown.retarget(0, NOW + 200);
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_active());
        assert!(!countdown.is_ticking());
    }

    #[test]
    fn retarget_to_same_time_keeps_schedule() {
        let mut countdown = Countdown::start(NOW + 10_000, NOW);
        countdown.retarget(NOW + 10_000, NOW + 200);
        assert_eq!(countdown.next_tick_in(NOW + 200), Some(Duration::from_millis(50)));
    }

    #[test]
    fn remaining_never_negative() {
        let mut countdown = Countdown::start(NOW + 300, NOW);
        countdown.tick(NOW + 10_000);
        assert_eq!(countdown.remaining(), 0);
    }
}
