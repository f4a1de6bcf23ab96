//! # Revenue Dashboard
//!
//! The filtering, KPI and aggregation pipeline behind a hospital's billing
//! revenue dashboard. A UI layer hands in the current date range, picker
//! values and chart clicks; this crate hands back the tables to draw.
//!
//! ## Core Concepts
//!
//! - **Billing table**: an immutable snapshot of line items fetched from the
//!   billing API for one date range, cached per source URL
//! - **Excluded departments**: lines of business dropped before any other
//!   filter, whatever the user picks
//! - **KPIs**: for-the-day, month, same month last year, year and last year
//!   totals relative to an explicit processing date
//! - **Views**: revenue trend (daily/monthly/yearly), department, doctor
//!   (after a department is clicked) and service breakdowns
//! - **Session**: the per-user cache, trend frequency and drill-down state
//!
//! ## Example
//!
//! ```rust,ignore
//! use revenue_dashboard::*;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
//! let mut session = DashboardSession::new(DashboardConfig::default(), today)?;
//! session.set_range(DateRange::new(
//!     NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
//!     today,
//! )?);
//!
//! let source = RemoteSource::new(session.config())?;
//! let report = session.render(&source, &DashboardQuery::default(), today).await?;
//! for line in report.kpis.display_lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod kpi;
pub mod loader;
pub mod schema;
pub mod session;
pub mod state;
pub mod utils;

pub use aggregation::{
    group_and_sum, revenue_by_department, revenue_by_doctor, revenue_by_period,
    service_summary, DoctorView, GroupTotal, PeriodTotal, ServiceTotal,
};
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use filter::{available_departments, doctor_options, filter};
pub use ingestion::parse_billing_payload;
pub use kpi::{compute_kpis, KpiResult};
#[cfg(feature = "remote")]
pub use loader::RemoteSource;
pub use loader::{build_locator, TableCache};
pub use schema::*;
pub use session::DashboardSession;
pub use state::{Frequency, Selection, SelectionEvent};
pub use utils::format_crores;

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

/// The department picker: everything, or one named department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartmentChoice {
    #[default]
    All,
    Named(String),
}

/// Picker and search-box values for one render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub department: DepartmentChoice,
    pub doctors: Vec<String>,
    pub search: Option<String>,
}

/// Session state a render depends on besides the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub range: DateRange,
    pub frequency: Frequency,
    pub selection: Selection,
}

impl ViewState {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            frequency: Frequency::default(),
            selection: Selection::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// The source returned no usable rows for the range.
    NoData,
    /// Rows were loaded but the current filters exclude all of them.
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub view: ViewState,
    /// Rows left after every filter.
    pub row_count: usize,
    pub kpis: KpiResult,
    pub trend: Vec<PeriodTotal>,
    pub departments: Vec<GroupTotal>,
    pub doctors: DoctorView,
    pub services: Vec<ServiceTotal>,
    pub department_options: Vec<String>,
    pub doctor_options: Vec<String>,
    pub notice: Option<Notice>,
}

impl DashboardReport {
    /// A report with every view empty, shown when the source had no data.
    pub fn no_data(view: ViewState) -> Self {
        let doctors = revenue_by_doctor(&BillingTable::default(), &view.selection);
        Self {
            view,
            row_count: 0,
            kpis: KpiResult::default(),
            trend: Vec::new(),
            departments: Vec::new(),
            doctors,
            services: Vec::new(),
            department_options: Vec::new(),
            doctor_options: Vec::new(),
            notice: Some(Notice::NoData),
        }
    }
}

/// Runs one render of the pipeline over a loaded table.
///
/// The date window and search apply first, then the department and doctor
/// pickers. KPIs and every view are computed over what is left; picker
/// options come from the unfiltered table.
pub fn build_report(
    table: &BillingTable,
    view: &ViewState,
    query: &DashboardQuery,
    excluded: &[String],
    today: NaiveDate,
) -> DashboardReport {
    let mut top_level = FilterCriteria::new(view.range);
    top_level.search = query.search.clone();
    let searched = filter(table, &top_level, excluded);

    let department = match &query.department {
        DepartmentChoice::All => None,
        DepartmentChoice::Named(name) => Some(name.as_str()),
    };
    let narrowed = FilterCriteria::new(view.range)
        .with_departments(department)
        .with_doctors(query.doctors.iter().cloned());
    let filtered = filter(&searched, &narrowed, excluded);

    info!(
        "Building report over {} of {} billing rows at {} frequency",
        filtered.len(),
        table.len(),
        view.frequency.label()
    );

    let notice = if table.dated_len() == 0 {
        Some(Notice::NoData)
    } else if filtered.is_empty() {
        Some(Notice::NoMatches)
    } else {
        None
    };

    DashboardReport {
        view: view.clone(),
        row_count: filtered.len(),
        kpis: compute_kpis(&filtered, today),
        trend: revenue_by_period(&filtered, view.frequency),
        departments: revenue_by_department(&filtered),
        doctors: revenue_by_doctor(&filtered, &view.selection),
        services: service_summary(&filtered),
        department_options: available_departments(table, excluded),
        doctor_options: doctor_options(table, department),
        notice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(
        day: NaiveDate,
        dept: &str,
        doctor: &str,
        service: &str,
        uhid: &str,
        net: f64,
    ) -> BillingRecord {
        BillingRecord::new(Some(day), dept, doctor, service, uhid, net)
    }

    fn table() -> BillingTable {
        BillingTable::new(vec![
            rec(date(2024, 5, 15), "Cardiology", "Dr. Rao", "ECG", "UH1", 500.0),
            rec(date(2024, 5, 14), "Cardiology", "Dr. Mehta", "Echo", "UH2", 1500.0),
            rec(date(2024, 5, 10), "Oncology", "Dr. Iyer", "Chemo", "UH3", 9000.0),
            rec(date(2024, 5, 10), "Hepatology", "Dr. Sen", "Fibroscan", "UH4", 700.0),
        ])
    }

    fn may() -> ViewState {
        ViewState::new(DateRange::new(date(2024, 5, 1), date(2024, 5, 15)).unwrap())
    }

    fn excluded() -> Vec<String> {
        DashboardConfig::default().excluded_departments
    }

    #[test]
    fn test_end_to_end_report() {
        let today = date(2024, 5, 15);
        let mut view = may();
        view.selection = Selection::Department("Cardiology".to_string());

        let report = build_report(&table(), &view, &DashboardQuery::default(), &excluded(), today);

        assert_eq!(report.row_count, 3);
        assert_eq!(report.notice, None);
        assert_eq!(report.kpis.ftd, 500.0);
        assert_eq!(report.kpis.mtd, 11000.0);
        assert_eq!(report.departments.len(), 2);
        assert_eq!(report.departments[0].key, "Cardiology");
        assert_eq!(report.doctors.rows().len(), 2);
        assert_eq!(report.doctors.rows()[0].key, "Dr. Rao");
        assert_eq!(report.trend.len(), 6);
        assert_eq!(report.department_options, vec!["Cardiology", "Oncology"]);
        assert_eq!(report.doctor_options.len(), 4);
    }

    #[test]
    fn test_department_choice_and_search() {
        let today = date(2024, 5, 15);
        let query = DashboardQuery {
            department: DepartmentChoice::Named("Cardiology".to_string()),
            doctors: vec![],
            search: Some("echo".to_string()),
        };

        let report = build_report(&table(), &may(), &query, &excluded(), today);
        assert_eq!(report.row_count, 1);
        assert_eq!(report.kpis.mtd, 1500.0);
        assert_eq!(report.doctor_options, vec!["Dr. Rao", "Dr. Mehta"]);
        assert!(report.doctors.is_prompt());
    }

    #[test]
    fn test_no_matches_notice() {
        let query = DashboardQuery {
            search: Some("no such service".to_string()),
            ..DashboardQuery::default()
        };
        let report = build_report(&table(), &may(), &query, &excluded(), date(2024, 5, 15));
        assert_eq!(report.notice, Some(Notice::NoMatches));
        assert_eq!(report.kpis, KpiResult::default());
        assert!(report.departments.is_empty());
    }

    #[test]
    fn test_no_data_report() {
        let report = DashboardReport::no_data(may());
        assert_eq!(report.notice, Some(Notice::NoData));
        assert!(report.doctors.is_prompt());
        assert_eq!(report.row_count, 0);
    }
}
