//! Calendar arithmetic for years of service.
//!
//! A year counts once its anniversary date has been reached. An employee who
//! joined on 29 February celebrates on 1 March in non-leap years, so
//! 2020-02-29 reaches 3 years on 2023-03-01 and not on 2023-02-28.

use chrono::{Datelike, NaiveDate};

/// Returns the number of completed calendar years between `join_date` and `today`.
///
/// Dates on or before the join date yield 0.
pub fn years_of_service(join_date: NaiveDate, today: NaiveDate) -> u32 {
    if today <= join_date {
        return 0;
    }

    let mut years = today.year() - join_date.year();
    if (today.month(), today.day()) < (join_date.month(), join_date.day()) {
        years -= 1;
    }

    u32::try_from(years).unwrap_or(0)
}

/// Short label describing tenure, e.g. `"New Employee"` or `"3 years"`.
pub fn tenure_label(years: u32) -> String {
    match years {
        0 => "New Employee".to_string(),
        1 => "1 year".to_string(),
        n => format!("{n} years"),
    }
}
