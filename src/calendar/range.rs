use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{validator::Rejection, YearMonth};

/// A span of nights `[start, end)`. The end date is the check-out day and is
/// not itself occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawRange> for DateRange {
    type Error = Rejection;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Rejection> {
        if start > end {
            return Err(Rejection::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(night: NaiveDate) -> Self {
        Self {
            start: night,
            end: night + Duration::days(1),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        usize::try_from((self.end - self.start).num_days()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day < end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn last_night(&self) -> Option<NaiveDate> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - Duration::days(1))
        }
    }

    /// Every month holding at least one night of the range, in order.
    pub fn months(&self) -> Vec<YearMonth> {
        let Some(last) = self.last_night() else {
            return Vec::new();
        };
        let last_month = YearMonth::of(last);
        let mut month = YearMonth::of(self.start);
        let mut months = vec![month];
        while month < last_month {
            month = month.next();
            months.push(month);
        }
        months
    }

    /// Human-readable span: the night itself, or first and last night.
    pub fn describe(&self) -> String {
        match self.last_night() {
            None => String::new(),
            Some(last) if last == self.start => self.start.to_string(),
            Some(last) => format!("{} to {}", self.start, last),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
