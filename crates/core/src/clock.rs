//! Injected clock for deterministic date handling.
//!
//! Period auto-opening and recurring schedules depend on "today". The
//! clock is passed in explicitly so tests can pin the calendar.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current date and time.
pub trait Clock: Send + Sync {
    /// Returns the current calendar date.
    fn today(&self) -> NaiveDate;

    /// Returns the current instant, used for audit timestamps.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a settable date, for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    /// Creates a clock pinned to the given date.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    /// Moves the clock to a new date.
    pub fn set_today(&self, today: NaiveDate) {
        let mut guard = match self.today.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.today.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fixed_clock_returns_pinned_date() {
        let clock = FixedClock::new(date(2024, 1, 15));
        assert_eq!(clock.today(), date(2024, 1, 15));
    }

    #[test]
    fn fixed_clock_can_advance() {
        let clock = FixedClock::new(date(2024, 1, 15));
        clock.set_today(date(2024, 2, 1));
        assert_eq!(clock.today(), date(2024, 2, 1));
    }
}
