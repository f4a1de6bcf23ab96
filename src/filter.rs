//! Narrowing a loaded table down to what one render shows.
//!
//! The stages run in a fixed order: excluded departments are dropped first,
//! then the date window, then the department and doctor allow-lists, and the
//! free-text search last. Undated rows never survive the date window.

use crate::schema::{BillingRecord, BillingTable, FilterCriteria};
use chrono::NaiveDate;
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

pub fn filter(
    table: &BillingTable,
    criteria: &FilterCriteria,
    excluded: &[String],
) -> BillingTable {
    if table.is_empty() {
        return BillingTable::default();
    }

    let start = criteria.range.start();
    let end = criteria.range.end_exclusive();
    let needle = criteria.search_term().map(str::to_lowercase);

    let filtered = table.select(|record| {
        !is_excluded(&record.order_department, excluded)
            && record
                .bill_date
                .is_some_and(|date| date >= start && date < end)
            && (criteria.departments.is_empty()
                || criteria.departments.contains(&record.order_department))
            && (criteria.doctors.is_empty() || criteria.doctors.contains(&record.order_doctor))
            && needle
                .as_deref()
                .map_or(true, |needle| matches_search(record, needle))
    });

    debug!(
        "Filtered {} billing rows down to {} ({} to {})",
        table.len(),
        filtered.len(),
        start,
        criteria.range.end()
    );

    filtered
}

pub fn is_excluded(department: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|d| d == department)
}

/// Case-insensitive substring match against every field of the row.
/// `needle` must already be lowercase.
pub fn matches_search(record: &BillingRecord, needle: &str) -> bool {
    searchable_fields(record).any(|field| field.to_lowercase().contains(needle))
}

fn searchable_fields(record: &BillingRecord) -> impl Iterator<Item = String> + '_ {
    let text = [
        &record.order_department,
        &record.order_doctor,
        &record.service_name,
        &record.uhid,
    ]
    .into_iter()
    .cloned();

    let dates = record.bill_date.into_iter().flat_map(date_renderings);
    let extra = record.extra.values().filter_map(value_text);

    text.chain(dates)
        .chain(amount_renderings(record.net))
        .chain(extra)
}

/// `100` and `100.0` for whole amounts, so either spelling finds the row.
fn amount_renderings(net: f64) -> Vec<String> {
    let shortest = net.to_string();
    if net.is_finite() && net.fract() == 0.0 {
        vec![shortest, format!("{:.1}", net)]
    } else {
        vec![shortest]
    }
}

fn date_renderings(date: NaiveDate) -> [String; 2] {
    [
        date.format("%d-%m-%Y").to_string(),
        date.format("%Y-%m-%d").to_string(),
    ]
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Departments offered in the picker, in first-seen order.
pub fn available_departments(table: &BillingTable, excluded: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .iter()
        .map(|r| r.order_department.as_str())
        .filter(|d| !d.is_empty() && !is_excluded(d, excluded))
        .filter(|d| seen.insert(*d))
        .map(str::to_string)
        .collect()
}

/// Doctors offered in the picker, limited to one department when given.
pub fn doctor_options(table: &BillingTable, department: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .iter()
        .filter(|r| department.map_or(true, |d| r.order_department == d))
        .map(|r| r.order_doctor.as_str())
        .filter(|d| !d.is_empty())
        .filter(|d| seen.insert(*d))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::schema::DateRange;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn excluded() -> Vec<String> {
        DashboardConfig::default().excluded_departments
    }

    fn rec(
        day: Option<NaiveDate>,
        dept: &str,
        doctor: &str,
        service: &str,
        uhid: &str,
        net: f64,
    ) -> BillingRecord {
        BillingRecord::new(day, dept, doctor, service, uhid, net)
    }

    fn sample() -> BillingTable {
        BillingTable::new(vec![
            rec(Some(date(2024, 1, 1)), "Cardiology", "Dr. Rao", "ECG", "UH1", 200.0),
            rec(Some(date(2024, 1, 1)), "Hepatology", "Dr. Sen", "Fibroscan", "UH2", 100.0),
            rec(Some(date(2024, 1, 31)), "Oncology", "Dr. Iyer", "Chemo", "UH3", 900.0),
            rec(Some(date(2024, 2, 1)), "Cardiology", "Dr. Rao", "Echo", "UH4", 400.0),
            rec(None, "Cardiology", "Dr. Rao", "ECG", "UH5", 50.0),
        ])
    }

    fn january() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap()
    }

    #[test]
    fn test_empty_table_stays_empty() {
        let criteria = FilterCriteria::new(january()).with_departments(["Cardiology"]);
        assert!(filter(&BillingTable::default(), &criteria, &excluded()).is_empty());
    }

    #[test]
    fn test_window_includes_whole_end_day_and_drops_undated() {
        let result = filter(&sample(), &FilterCriteria::new(january()), &excluded());
        let services: Vec<&str> = result.iter().map(|r| r.service_name.as_str()).collect();
        assert_eq!(services, vec!["ECG", "Chemo"]);
    }

    #[test]
    fn test_excluded_department_cannot_be_selected_back_in() {
        let table = BillingTable::new(vec![
            rec(Some(date(2024, 1, 1)), "Hepatology", "A", "S", "U1", 100.0),
            rec(Some(date(2024, 1, 1)), "Cardiology", "B", "S", "U2", 200.0),
        ]);
        let criteria = FilterCriteria::new(DateRange::single_day(date(2024, 1, 1)))
            .with_departments(["Hepatology", "Cardiology"]);

        let result = filter(&table, &criteria, &excluded());
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0].order_department, "Cardiology");
        assert_eq!(result.total_net(), 200.0);
    }

    #[test]
    fn test_department_and_doctor_allow_lists() {
        let criteria = FilterCriteria::new(january()).with_departments(["Oncology"]);
        let result = filter(&sample(), &criteria, &excluded());
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0].order_doctor, "Dr. Iyer");

        let criteria = FilterCriteria::new(january()).with_doctors(["Dr. Rao"]);
        let result = filter(&sample(), &criteria, &excluded());
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0].service_name, "ECG");

        let criteria = FilterCriteria::new(january()).with_departments(["Neurology"]);
        assert!(filter(&sample(), &criteria, &excluded()).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let by_service = FilterCriteria::new(january()).with_search("CHEMO");
        assert_eq!(filter(&sample(), &by_service, &excluded()).len(), 1);

        let by_patient = FilterCriteria::new(january()).with_search("uh1");
        assert_eq!(filter(&sample(), &by_patient, &excluded()).len(), 1);

        let by_date = FilterCriteria::new(january()).with_search("31-01-2024");
        assert_eq!(filter(&sample(), &by_date, &excluded()).len(), 1);

        let by_amount = FilterCriteria::new(january()).with_search("900");
        assert_eq!(filter(&sample(), &by_amount, &excluded()).len(), 1);
    }

    #[test]
    fn test_search_matches_decimal_amount_spellings() {
        let whole = FilterCriteria::new(january()).with_search("900.0");
        assert_eq!(filter(&sample(), &whole, &excluded()).len(), 1);

        let table = BillingTable::new(vec![
            rec(Some(date(2024, 1, 2)), "Radiology", "Dr. Das", "MRI", "UH7", 1500.5),
            rec(Some(date(2024, 1, 3)), "Radiology", "Dr. Das", "X-Ray", "UH8", -250.0),
        ]);

        let fractional = FilterCriteria::new(january()).with_search("1500.5");
        assert_eq!(filter(&table, &fractional, &excluded()).len(), 1);

        let refund = FilterCriteria::new(january()).with_search("-250.0");
        assert_eq!(filter(&table, &refund, &excluded()).len(), 1);

        let padded = FilterCriteria::new(january()).with_search("1500.50");
        assert!(filter(&table, &padded, &excluded()).is_empty());
    }

    #[test]
    fn test_search_reaches_extra_columns() {
        let mut record = rec(Some(date(2024, 1, 5)), "Oncology", "Dr. Iyer", "Chemo", "UH9", 10.0);
        record.extra.insert("billNo".to_string(), Value::from("OP-55123"));
        record.extra.insert("ward".to_string(), Value::Null);
        let table = BillingTable::new(vec![record]);

        let criteria = FilterCriteria::new(january()).with_search("op-551");
        assert_eq!(filter(&table, &criteria, &excluded()).len(), 1);

        let criteria = FilterCriteria::new(january()).with_search("null");
        assert!(filter(&table, &criteria, &excluded()).is_empty());
    }

    #[test]
    fn test_picker_options() {
        let table = sample();
        assert_eq!(
            available_departments(&table, &excluded()),
            vec!["Cardiology", "Oncology"]
        );
        assert_eq!(
            doctor_options(&table, None),
            vec!["Dr. Rao", "Dr. Sen", "Dr. Iyer"]
        );
        assert_eq!(doctor_options(&table, Some("Oncology")), vec!["Dr. Iyer"]);
    }
}
