//! Calendar arithmetic for extension windows and expiry thresholds

use chrono::{Days, Months, NaiveDate};

use crate::errors::{MaintenanceError, MaintenanceResult};

/// Format used for dates written into version tags
pub const TAG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Subtract whole months, clamping to the last day of a shorter month
pub fn months_before(date: NaiveDate, months: u32) -> MaintenanceResult<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| MaintenanceError::date_out_of_range(date, format!("- {months} months")))
}

/// Add whole years, mapping Feb 29 to Feb 28 in non-leap years
pub fn years_after(date: NaiveDate, years: u32) -> MaintenanceResult<NaiveDate> {
    let months = years
        .checked_mul(12)
        .ok_or_else(|| MaintenanceError::date_out_of_range(date, format!("+ {years} years")))?;
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| MaintenanceError::date_out_of_range(date, format!("+ {years} years")))
}

pub fn days_after(date: NaiveDate, days: u32) -> MaintenanceResult<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| MaintenanceError::date_out_of_range(date, format!("+ {days} days")))
}

pub fn format_tag_date(date: NaiveDate) -> String {
    date.format(TAG_DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date, as written to tags and accepted on the command line
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), TAG_DATE_FORMAT)
}
