//! Partial dates and the age arithmetic built on them.
//!
//! Any of year, month and day may be unknown. Ordering treats an unknown
//! component as greater than every real value, so partially known dates sort
//! after fully known ones.

use crate::types::Person;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn new(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        Self { year, month, day }
    }

    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self::new(Some(year), Some(month), Some(day))
    }

    pub fn year_only(year: i32) -> Self {
        Self::new(Some(year), None, None)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        Self::ymd(date.year(), date.month(), date.day())
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.year.is_some() && self.month.is_some() && self.day.is_some()
    }

    /// Ordering key with unknown components mapped above any real value.
    pub fn sort_key(&self) -> (i64, i64, i64) {
        (
            self.year.map_or(i64::MAX, i64::from),
            self.month.map_or(i64::MAX, i64::from),
            self.day.map_or(i64::MAX, i64::from),
        )
    }

    /// Returns a description of the first problem found, if any.
    pub fn validate(&self) -> Option<String> {
        if let Some(year) = self.year {
            if NaiveDate::from_ymd_opt(year, 1, 1).is_none() {
                return Some(format!("year {} out of range", year));
            }
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Some(format!("month {} out of range", month));
            }
        }
        if let Some(day) = self.day {
            if !(1..=31).contains(&day) {
                return Some(format!("day {} out of range", day));
            }
        }
        if let (Some(year), Some(month), Some(day)) = (self.year, self.month, self.day) {
            if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                return Some(format!("{:04}-{:02}-{:02} is not a calendar day", year, month, day));
            }
        }
        None
    }
}

impl std::fmt::Display for PartialDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let year = self.year.map_or_else(|| "????".to_string(), |y| format!("{:04}", y));
        let month = self.month.map_or_else(|| "??".to_string(), |m| format!("{:02}", m));
        let day = self.day.map_or_else(|| "??".to_string(), |d| format!("{:02}", d));
        write!(f, "{}-{}-{}", year, month, day)
    }
}

/// Ascending comparison, unknown components last.
pub fn compare_missing_last(a: &PartialDate, b: &PartialDate) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

/// Full years between `birth` and `reference`.
///
/// Needs both years. Month and day only adjust the result when the component
/// is known on both sides; a one-sided month or day is ignored.
pub fn age_between(birth: &PartialDate, reference: &PartialDate) -> Option<i32> {
    let (from_year, to_year) = (birth.year?, reference.year?);
    let mut age = to_year.checked_sub(from_year)?;

    if let (Some(from_month), Some(to_month)) = (birth.month, reference.month) {
        if to_month < from_month {
            age = age.checked_sub(1)?;
        } else if to_month == from_month {
            if let (Some(from_day), Some(to_day)) = (birth.day, reference.day) {
                if to_day < from_day {
                    age = age.checked_sub(1)?;
                }
            }
        }
    }

    Some(age)
}

/// Age at death for the dead, otherwise age on `today`.
pub fn age_of(person: &Person, today: &PartialDate) -> Option<i32> {
    let reference = if person.is_dead() { &person.death_date } else { today };
    age_between(&person.birth_date, reference)
}
