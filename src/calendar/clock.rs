use chrono::{Local, NaiveDate};

/// Source of "today" for past-date checks.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Today in the local timezone of the staff member's machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
