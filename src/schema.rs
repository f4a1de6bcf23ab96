use crate::error::{DashboardError, Result};
use crate::utils::days_between;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One billed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    /// `None` when the source value was missing or not in day-month-year form.
    /// Such records never match a date window.
    pub bill_date: Option<NaiveDate>,
    pub order_department: String,
    pub order_doctor: String,
    pub service_name: String,
    /// Patient identifier.
    pub uhid: String,
    /// Revenue amount; negative for refunds.
    pub net: f64,
    /// Columns the dashboard does not model, kept so search sees the whole row.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BillingRecord {
    pub fn new(
        bill_date: Option<NaiveDate>,
        order_department: impl Into<String>,
        order_doctor: impl Into<String>,
        service_name: impl Into<String>,
        uhid: impl Into<String>,
        net: f64,
    ) -> Self {
        Self {
            bill_date,
            order_department: order_department.into(),
            order_doctor: order_doctor.into(),
            service_name: service_name.into(),
            uhid: uhid.into(),
            net,
            extra: serde_json::Map::new(),
        }
    }
}

/// An immutable snapshot of billing rows. Filtering produces a new table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingTable {
    records: Vec<BillingRecord>,
}

impl BillingTable {
    pub fn new(records: Vec<BillingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BillingRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BillingRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of rows whose date parsed.
    pub fn dated_len(&self) -> usize {
        self.records.iter().filter(|r| r.bill_date.is_some()).count()
    }

    pub fn total_net(&self) -> f64 {
        self.records.iter().map(|r| r.net).sum()
    }

    /// Copies the rows matching `predicate` into a new table.
    pub fn select<P>(&self, mut predicate: P) -> BillingTable
    where
        P: FnMut(&BillingRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|record| predicate(*record))
            .cloned()
            .collect()
    }
}

impl FromIterator<BillingRecord> for BillingTable {
    fn from_iter<I: IntoIterator<Item = BillingRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BillingTable {
    type Item = &'a BillingRecord;
    type IntoIter = std::slice::Iter<'a, BillingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Inclusive calendar range picked in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DashboardError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(DashboardError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The day after `end`, so the whole end day is inside the window.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end_exclusive()
    }

    pub fn span_days(&self) -> i64 {
        days_between(self.start, self.end)
    }
}

/// Everything a render filters by.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub range: DateRange,
    /// Empty means every department.
    pub departments: BTreeSet<String>,
    /// Empty means every doctor.
    pub doctors: BTreeSet<String>,
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            departments: BTreeSet::new(),
            doctors: BTreeSet::new(),
            search: None,
        }
    }

    pub fn with_departments<I, S>(mut self, departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.departments = departments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_doctors<I, S>(mut self, doctors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doctors = doctors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// The search term, if it has any non-whitespace content.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
