//! Display formatting for FHIR dates.

use crate::constants::NOT_AVAILABLE;
use fhir::FhirDate;

/// Render a date as `dd/mm/yyyy`.
///
/// Reduced-precision dates keep their precision (`mm/yyyy`, `yyyy`). Date-times are
/// shown in the offset the server recorded them with.
pub fn format_date(date: &FhirDate) -> String {
    match date {
        FhirDate::Year(y) => format!("{y:04}"),
        FhirDate::YearMonth(y, m) => format!("{m:02}/{y:04}"),
        FhirDate::Date(d) => d.format("%d/%m/%Y").to_string(),
        FhirDate::DateTime(dt) => dt.format("%d/%m/%Y").to_string(),
    }
}

/// [`format_date`], or `N/A` when there is no date.
pub fn format_optional_date(date: Option<&FhirDate>) -> String {
    date.map_or_else(|| NOT_AVAILABLE.to_owned(), format_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> FhirDate {
        FhirDate::parse(s).expect("valid FHIR date")
    }

    #[test]
    fn test_full_dates_render_day_month_year() {
        assert_eq!(format_date(&parse("1987-03-09")), "09/03/1987");
        assert_eq!(format_date(&parse("2024-12-31T23:30:00+02:00")), "31/12/2024");
        // Late evening west of UTC stays on the recorded day.
        assert_eq!(format_date(&parse("2024-01-01T22:00:00-05:00")), "01/01/2024");
    }

    #[test]
    fn test_partial_dates_keep_their_precision() {
        assert_eq!(format_date(&parse("2024")), "2024");
        assert_eq!(format_date(&parse("2024-05")), "05/2024");
    }

    #[test]
    fn test_missing_date_is_not_available() {
        assert_eq!(format_optional_date(None), "N/A");
        assert_eq!(format_optional_date(Some(&parse("2000-02-29"))), "29/02/2000");
    }
}
