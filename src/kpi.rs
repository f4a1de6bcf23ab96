use crate::schema::BillingTable;
use crate::utils::{format_crores, CRORE};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Period-to-date revenue totals relative to a processing date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    /// For the day: billed on the processing date.
    pub ftd: f64,
    /// Same calendar month as the processing date.
    pub mtd: f64,
    /// Same month number, previous year (the whole month).
    pub lysmtd: f64,
    /// Same calendar year.
    pub ytd: f64,
    /// Previous calendar year (the whole year).
    pub lytd: f64,
}

impl KpiResult {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("FTD", self.ftd),
            ("MTD", self.mtd),
            ("LYSMTD", self.lysmtd),
            ("YTD", self.ytd),
            ("LYTD", self.lytd),
        ]
        .into_iter()
    }

    pub fn to_crores(&self) -> KpiResult {
        KpiResult {
            ftd: self.ftd / CRORE,
            mtd: self.mtd / CRORE,
            lysmtd: self.lysmtd / CRORE,
            ytd: self.ytd / CRORE,
            lytd: self.lytd / CRORE,
        }
    }

    /// `"MTD: ₹1.25 Cr"` style lines in display order.
    pub fn display_lines(&self) -> Vec<String> {
        self.iter()
            .map(|(label, value)| format!("{}: {}", label, format_crores(value)))
            .collect()
    }
}

pub fn compute_kpis(table: &BillingTable, today: NaiveDate) -> KpiResult {
    let year = today.year();
    let month = today.month();
    let last_year = year - 1;

    let mut kpis = KpiResult::default();

    for record in table {
        let Some(date) = record.bill_date else {
            continue;
        };

        if date == today {
            kpis.ftd += record.net;
        }
        if date.year() == year && date.month() == month {
            kpis.mtd += record.net;
        }
        if date.year() == last_year && date.month() == month {
            kpis.lysmtd += record.net;
        }
        if date.year() == year {
            kpis.ytd += record.net;
        }
        if date.year() == last_year {
            kpis.lytd += record.net;
        }
    }

    kpis
}
