// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tax periods and their `MMYYYY` codes.
//!
//! Users type periods in many shapes (`Jan 2026`, `January 2026`, `01/2026`,
//! `1-2026`, `012026`, `2026-01`). Everything is normalized to a [`Period`],
//! whose [`Period::code`] is the form the filing SMS expects.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GstError;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// GST went live in July 2017; nothing earlier can be filed.
const FIRST_GST_PERIOD: Period = Period {
    year: 2017,
    month: 7,
};

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])((?:19|20)\d{2})$").expect("period code regex"));

static MONTH_YEAR_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})\s*[/\-. ]?\s*(\d{4})$").expect("numeric period regex")
});

static YEAR_MONTH_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\s*[/\-]\s*(\d{1,2})$").expect("iso period regex"));

static MONTH_NAME_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]{3,9})\.?[\s,\-/']*(\d{4}|\d{2})$").expect("named period regex")
});

/// A calendar month for which a return is filed.
///
/// Ordered chronologically (year first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Builds a period, checking the month range.
    pub fn new(month: u32, year: i32) -> Result<Self, GstError> {
        if !(1..=12).contains(&month) || !(1900..=2099).contains(&year) {
            return Err(GstError::InvalidPeriod(format!("{month:02}{year}")));
        }
        Ok(Self { year, month })
    }

    /// The period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn year(self) -> i32 {
        self.year
    }

    /// `MMYYYY`, e.g. `022026`.
    pub fn code(self) -> String {
        format!("{:02}{:04}", self.month, self.year)
    }

    /// Human form, e.g. `February 2026`.
    pub fn display_name(self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// Parses a strict `MMYYYY` code.
    pub fn from_code(code: &str) -> Result<Self, GstError> {
        let caps = CODE_PATTERN
            .captures(code.trim())
            .ok_or_else(|| GstError::InvalidPeriod(code.trim().to_string()))?;
        let month = caps[1]
            .parse()
            .map_err(|_| GstError::InvalidPeriod(code.to_string()))?;
        let year = caps[2]
            .parse()
            .map_err(|_| GstError::InvalidPeriod(code.to_string()))?;
        Self::new(month, year)
    }

    /// Parses any of the accepted free-text shapes.
    pub fn parse(input: &str) -> Result<Self, GstError> {
        let cleaned = input.trim().to_ascii_lowercase();
        let invalid = || GstError::InvalidPeriod(input.trim().to_string());

        if let Some(caps) = MONTH_YEAR_NUMERIC.captures(&cleaned) {
            let month = caps[1].parse().map_err(|_| invalid())?;
            let year = caps[2].parse().map_err(|_| invalid())?;
            return Self::new(month, year).map_err(|_| invalid());
        }

        if let Some(caps) = YEAR_MONTH_NUMERIC.captures(&cleaned) {
            let year = caps[1].parse().map_err(|_| invalid())?;
            let month = caps[2].parse().map_err(|_| invalid())?;
            return Self::new(month, year).map_err(|_| invalid());
        }

        if let Some(caps) = MONTH_NAME_YEAR.captures(&cleaned) {
            let month = month_from_name(&caps[1]).ok_or_else(invalid)?;
            let mut year: i32 = caps[2].parse().map_err(|_| invalid())?;
            if caps[2].len() == 2 {
                year += 2000;
            }
            return Self::new(month, year).map_err(|_| invalid());
        }

        Err(invalid())
    }

    /// The month before this one.
    pub fn previous(self) -> Self {
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

    /// The `count` most recent periods that have ended as of `today`,
    /// newest first.
    pub fn recent(today: NaiveDate, count: usize) -> Vec<Self> {
        let mut periods = Vec::with_capacity(count);
        let mut current = Self::containing(today).previous();
        while periods.len() < count && current >= FIRST_GST_PERIOD {
            periods.push(current);
            current = current.previous();
        }
        periods
    }

    /// Checks that the period has ended and falls within the GST era.
    pub fn ensure_fileable(self, today: NaiveDate) -> Result<Self, GstError> {
        if self < FIRST_GST_PERIOD {
            return Err(GstError::PeriodBeforeGst(self.display_name()));
        }
        if self >= Self::containing(today) {
            return Err(GstError::FuturePeriod(self.display_name()));
        }
        Ok(self)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Period::from_code(&raw).map_err(serde::de::Error::custom)
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|full| full.to_ascii_lowercase().starts_with(name))
        .map(|idx| idx as u32 + 1)
}

/// Normalizes free-text period input to its `MMYYYY` code.
pub fn normalize_period(input: &str) -> Result<String, GstError> {
    Period::parse(input).map(Period::code)
}

/// Renders an `MMYYYY` code as `Month YYYY`.
pub fn format_period_for_display(code: &str) -> Result<String, GstError> {
    Period::from_code(code).map(Period::display_name)
}
