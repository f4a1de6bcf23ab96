//! Per-user dashboard state.
//!
//! One `DashboardSession` holds everything a single user's dashboard
//! remembers between interactions: the table cache, the picked date range,
//! the trend frequency and the clicked department. Nothing is process-wide,
//! so a server can keep one session per user.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::loader::{build_locator, TableCache};
use crate::schema::{BillingTable, DateRange};
use crate::state::{Frequency, Selection, SelectionEvent};
use crate::{build_report, DashboardQuery, DashboardReport, ViewState};
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;

#[cfg(feature = "remote")]
use crate::loader::RemoteSource;

#[derive(Debug)]
pub struct DashboardSession {
    config: DashboardConfig,
    cache: TableCache,
    view: ViewState,
}

impl DashboardSession {
    /// Starts a session showing `today` only, at daily frequency, with no
    /// department selected.
    pub fn new(config: DashboardConfig, today: NaiveDate) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: TableCache::new(),
            view: ViewState::new(DateRange::single_day(today)),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    pub fn range(&self) -> DateRange {
        self.view.range
    }

    pub fn frequency(&self) -> Frequency {
        self.view.frequency
    }

    pub fn selection(&self) -> &Selection {
        &self.view.selection
    }

    /// Changes the date range and re-validates the trend frequency.
    pub fn set_range(&mut self, range: DateRange) -> Frequency {
        if range != self.view.range {
            info!("Date range changed to {} .. {}", range.start(), range.end());
        }
        self.view.range = range;
        self.view.frequency = self.view.frequency.reconcile(&range);
        self.view.frequency
    }

    pub fn frequency_available(&self, target: Frequency) -> bool {
        target.is_available(&self.view.range)
    }

    pub fn request_frequency(&mut self, target: Frequency) -> Frequency {
        let next = self.view.frequency.request(target, &self.view.range);
        if next != target {
            debug!(
                "{} trend not available for the current range",
                target.label()
            );
        }
        self.view.frequency = next;
        next
    }

    pub fn handle_selection(&mut self, event: SelectionEvent) -> &Selection {
        let current = std::mem::take(&mut self.view.selection);
        self.view.selection = current.apply(event);
        &self.view.selection
    }

    pub fn locator(&self) -> Result<String> {
        build_locator(&self.config, &self.view.range)
    }

    /// Loads the table for the current range, using `fetch` for the raw body
    /// on a cache miss.
    pub fn load_with<F>(&mut self, fetch: F) -> Result<Arc<BillingTable>>
    where
        F: FnOnce(&str) -> Result<Vec<u8>>,
    {
        let locator = self.locator()?;
        self.cache.get_or_fetch(&locator, fetch)
    }

    #[cfg(feature = "remote")]
    pub async fn load(&mut self, source: &RemoteSource) -> Result<Arc<BillingTable>> {
        let locator = self.locator()?;
        self.cache.get_or_fetch_remote(source, &locator).await
    }

    pub fn report(
        &self,
        table: &BillingTable,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> DashboardReport {
        build_report(
            table,
            &self.view,
            query,
            &self.config.excluded_departments,
            today,
        )
    }

    /// Loads and reports in one go. An empty source gives a "no data" report;
    /// load failures are returned to the caller.
    pub fn render_with<F>(
        &mut self,
        query: &DashboardQuery,
        today: NaiveDate,
        fetch: F,
    ) -> Result<DashboardReport>
    where
        F: FnOnce(&str) -> Result<Vec<u8>>,
    {
        let loaded = self.load_with(fetch);
        self.finish_render(loaded, query, today)
    }

    #[cfg(feature = "remote")]
    pub async fn render(
        &mut self,
        source: &RemoteSource,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> Result<DashboardReport> {
        let loaded = self.load(source).await;
        self.finish_render(loaded, query, today)
    }

    fn finish_render(
        &self,
        loaded: Result<Arc<BillingTable>>,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> Result<DashboardReport> {
        match loaded {
            Ok(table) => Ok(self.report(&table, query, today)),
            Err(e) if e.is_empty_result() => {
                info!("{}", e);
                Ok(DashboardReport::no_data(self.view.clone()))
            }
            Err(e) => Err(e),
        }
    }
}
