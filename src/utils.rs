use chrono::{Datelike, Days, NaiveDate};

/// Day-month-year layout the billing API uses for `billDate`.
pub const BILL_DATE_FORMAT: &str = "%d-%m-%Y";

/// Layout the billing API expects for its `FromDate`/`ToDate` parameters.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// One crore (10 million), the unit KPI cards are shown in.
pub const CRORE: f64 = 1e7;

/// Parses a `billDate` value. Anything that does not match
/// [`BILL_DATE_FORMAT`] yields `None` instead of an error.
pub fn parse_bill_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BILL_DATE_FORMAT).ok()
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

pub fn year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

pub fn next_month_end(date: NaiveDate) -> NaiveDate {
    month_end(date)
        .checked_add_days(Days::new(1))
        .map(month_end)
        .unwrap_or(date)
}

pub fn next_year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() + 1, 12, 31).unwrap_or(date)
}

/// Whole days from `start` to `end`; a same-day range spans zero days.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Renders an amount in crores, e.g. `₹1.25 Cr`.
pub fn format_crores(value: f64) -> String {
    format!("₹{:.2} Cr", value / CRORE)
}
