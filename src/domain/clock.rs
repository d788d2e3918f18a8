use chrono::{Local, NaiveDateTime};

/// Source of "now" for every time-dependent operation, so tests can pin it.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in local time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub use fixed::FixedClock;
