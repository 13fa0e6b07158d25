use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        // Rejects month 0/13 and years chrono cannot represent.
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("invalid month {year:04}-{month:02}"))?;
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// First day of the following month, i.e. the exclusive upper bound.
    pub fn end(&self) -> NaiveDate {
        self.next().first_day()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end() - Duration::days(1)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end();
        self.first_day().iter_days().take_while(move |day| *day < end)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (year, month) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("expected YYYY-MM, got '{value}'"))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(anyhow!("expected YYYY-MM, got '{value}'"));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow!("invalid year in '{value}'"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| anyhow!("invalid month in '{value}'"))?;
        Self::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_and_formats() {
        let month: YearMonth = "2024-06".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 6);
        assert_eq!(month.to_string(), "2024-06");
    }

    #[test]
    fn rejects_malformed_months() {
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-00".parse::<YearMonth>().is_err());
        assert!("2024/06".parse::<YearMonth>().is_err());
        assert!("24-06".parse::<YearMonth>().is_err());
        assert!("2024-6".parse::<YearMonth>().is_err());
    }

    #[test]
    fn bounds_and_days() {
        let feb: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(feb.first_day(), day(2024, 2, 1));
        assert_eq!(feb.last_day(), day(2024, 2, 29));
        assert_eq!(feb.end(), day(2024, 3, 1));
        assert_eq!(feb.days().count(), 29);
        assert!(feb.contains(day(2024, 2, 29)));
        assert!(!feb.contains(day(2024, 3, 1)));
    }

    #[test]
    fn navigation_wraps_years() {
        let dec: YearMonth = "2024-12".parse().unwrap();
        assert_eq!(dec.next().to_string(), "2025-01");
        assert_eq!(dec.next().prev(), dec);
        let jan: YearMonth = "2024-01".parse().unwrap();
        assert_eq!(jan.prev().to_string(), "2023-12");
    }

    #[test]
    fn serde_uses_the_string_form() {
        let month: YearMonth = "2024-06".parse().unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2024-06\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }
}
