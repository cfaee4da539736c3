//! FHIR `date` and `dateTime` values.
//!
//! FHIR allows reduced precision (`2024`, `2024-05`) as well as full dates and
//! instants with a timezone offset. The original precision is preserved so display
//! code can render exactly what the server recorded.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use std::fmt;

/// A parsed FHIR `date` or `dateTime`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FhirDate {
    Year(i32),
    YearMonth(i32, u32),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl FhirDate {
    /// Parse a FHIR date or dateTime string.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if the value is not one of the FHIR date forms.
    pub fn parse(input: &str) -> FhirResult<Self> {
        let s = input.trim();
        let invalid = || FhirError::Translation(format!("invalid FHIR date: {s:?}"));

        if s.contains('T') {
            return DateTime::parse_from_rfc3339(s)
                .map(FhirDate::DateTime)
                .map_err(|_| invalid());
        }

        match s.len() {
            4 => s.parse::<i32>().map(FhirDate::Year).map_err(|_| invalid()),
            7 => {
                let (year, month) = s.split_once('-').ok_or_else(invalid)?;
                let year = year.parse::<i32>().map_err(|_| invalid())?;
                let month = month.parse::<u32>().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(FhirDate::YearMonth(year, month))
            }
            10 => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(FhirDate::Date)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            FhirDate::Year(y) | FhirDate::YearMonth(y, _) => *y,
            FhirDate::Date(d) => d.year(),
            FhirDate::DateTime(dt) => dt.year(),
        }
    }

    pub fn month(&self) -> Option<u32> {
        match self {
            FhirDate::Year(_) => None,
            FhirDate::YearMonth(_, m) => Some(*m),
            FhirDate::Date(d) => Some(d.month()),
            FhirDate::DateTime(dt) => Some(dt.month()),
        }
    }

    pub fn day(&self) -> Option<u32> {
        match self {
            FhirDate::Year(_) | FhirDate::YearMonth(..) => None,
            FhirDate::Date(d) => Some(d.day()),
            FhirDate::DateTime(dt) => Some(dt.day()),
        }
    }
}

impl fmt::Display for FhirDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhirDate::Year(y) => write!(f, "{y:04}"),
            FhirDate::YearMonth(y, m) => write!(f, "{y:04}-{m:02}"),
            FhirDate::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FhirDate::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Parse an optional wire string into an optional [`FhirDate`].
pub(crate) fn parse_optional(value: Option<String>, field: &str) -> FhirResult<Option<FhirDate>> {
    value
        .map(|s| {
            FhirDate::parse(&s).map_err(|e| FhirError::Translation(format!("{field}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_precision() {
        assert_eq!(FhirDate::parse("1992").unwrap(), FhirDate::Year(1992));
        assert_eq!(FhirDate::parse("1992-03").unwrap(), FhirDate::YearMonth(1992, 3));
        assert_eq!(
            FhirDate::parse("1992-03-20").unwrap(),
            FhirDate::Date(NaiveDate::from_ymd_opt(1992, 3, 20).unwrap())
        );

        let dt = FhirDate::parse("2024-05-01T09:30:00+02:00").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, Some(5), Some(1)));
    }

    #[test]
    fn keeps_the_recorded_offset() {
        // 23:30 at -05:00 is the next day in UTC; the recorded day must be kept.
        let dt = FhirDate::parse("2024-01-31T23:30:00-05:00").unwrap();
        assert_eq!(dt.day(), Some(31));
    }

    #[test]
    fn rejects_malformed_values() {
        for bad in ["", "92", "1992-13", "1992-02-30", "20-03-1992", "2024-05-01T25:00:00Z"] {
            assert!(FhirDate::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
