//! Group-and-sum reductions backing the dashboard charts.
//!
//! Category views group in key order and then sort ascending by total with a
//! stable sort, so equal totals keep alphabetical order. The period trend is
//! chronological and has no gaps between its first and last bucket.

use crate::schema::{BillingRecord, BillingTable};
use crate::state::{Frequency, Selection};
use crate::utils::{month_end, next_month_end, next_year_end, year_end};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotal {
    /// Last day of the bucket: the day itself, the month end or Dec 31.
    pub period_end: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTotal {
    pub service_name: String,
    /// Distinct patients billed for the service.
    pub volume: usize,
    pub net: f64,
}

/// What the doctor panel shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DoctorView {
    /// No department is selected; ask the user to click one.
    Prompt,
    Chart(Vec<GroupTotal>),
}

impl DoctorView {
    pub fn rows(&self) -> &[GroupTotal] {
        match self {
            DoctorView::Prompt => &[],
            DoctorView::Chart(rows) => rows,
        }
    }

    pub fn is_prompt(&self) -> bool {
        matches!(self, DoctorView::Prompt)
    }
}

pub fn group_and_sum<F>(table: &BillingTable, key: F) -> Vec<GroupTotal>
where
    F: Fn(&BillingRecord) -> &str,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for record in table {
        *groups.entry(key(record)).or_insert(0.0) += record.net;
    }

    let mut totals: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(key, total)| GroupTotal {
            key: key.to_string(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| a.total.total_cmp(&b.total));
    totals
}

pub fn revenue_by_department(table: &BillingTable) -> Vec<GroupTotal> {
    group_and_sum(table, |r| r.order_department.as_str())
}

pub fn revenue_by_doctor(table: &BillingTable, selection: &Selection) -> DoctorView {
    let Some(department) = selection.department() else {
        return DoctorView::Prompt;
    };

    let subset = table.select(|r| r.order_department == department);
    DoctorView::Chart(group_and_sum(&subset, |r| r.order_doctor.as_str()))
}

pub fn service_summary(table: &BillingTable) -> Vec<ServiceTotal> {
    let mut groups: BTreeMap<&str, (HashSet<&str>, f64)> = BTreeMap::new();
    for record in table {
        let (patients, net) = groups.entry(record.service_name.as_str()).or_default();
        if !record.uhid.is_empty() {
            patients.insert(record.uhid.as_str());
        }
        *net += record.net;
    }

    let mut summary: Vec<ServiceTotal> = groups
        .into_iter()
        .map(|(service_name, (patients, net))| ServiceTotal {
            service_name: service_name.to_string(),
            volume: patients.len(),
            net,
        })
        .collect();
    summary.sort_by(|a, b| a.net.total_cmp(&b.net));
    summary
}

pub fn bucket_end(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date,
        Frequency::Monthly => month_end(date),
        Frequency::Yearly => year_end(date),
    }
}

fn next_bucket_end(current: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    let next = match frequency {
        Frequency::Daily => current.succ_opt()?,
        Frequency::Monthly => next_month_end(current),
        Frequency::Yearly => next_year_end(current),
    };
    (next > current).then_some(next)
}

/// Revenue trend at `frequency`. Undated rows are skipped; buckets with no
/// rows between the first and last occupied one report zero.
pub fn revenue_by_period(table: &BillingTable, frequency: Frequency) -> Vec<PeriodTotal> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in table {
        if let Some(date) = record.bill_date {
            *buckets.entry(bucket_end(date, frequency)).or_insert(0.0) += record.net;
        }
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut series = Vec::new();
    let mut current = Some(first);
    while let Some(period_end) = current.filter(|d| *d <= last) {
        series.push(PeriodTotal {
            period_end,
            total: buckets.get(&period_end).copied().unwrap_or(0.0),
        });
        current = next_bucket_end(period_end, frequency);
    }
    series
}
