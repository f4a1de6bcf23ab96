use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::ingestion::parse_billing_payload;
use crate::schema::{BillingTable, DateRange};
use crate::utils::QUERY_DATE_FORMAT;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Fills the configured template with the range and auxiliary flags.
pub fn build_locator(config: &DashboardConfig, range: &DateRange) -> Result<String> {
    config.validate()?;

    Ok(config
        .source_template
        .replace("{from}", &range.start().format(QUERY_DATE_FORMAT).to_string())
        .replace("{to}", &range.end().format(QUERY_DATE_FORMAT).to_string())
        .replace("{patient_type}", &config.patient_type)
        .replace("{ivf_flag}", &config.ivf_flag.to_string()))
}

/// Checks that a freshly parsed table has something to report on.
pub fn accept_table(locator: &str, table: BillingTable) -> Result<BillingTable> {
    if table.dated_len() == 0 {
        return Err(DashboardError::EmptyResult {
            locator: locator.to_string(),
        });
    }
    Ok(table)
}

fn as_load_error(locator: &str, err: DashboardError) -> DashboardError {
    match err {
        DashboardError::LoadError { .. } | DashboardError::EmptyResult { .. } => err,
        other => DashboardError::LoadError {
            locator: locator.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Tables already fetched in this session, keyed by source locator.
///
/// Only tables with at least one dated row are kept, so a failed or empty
/// load is retried on the next request.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<String, Arc<BillingTable>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locator: &str) -> Option<Arc<BillingTable>> {
        self.tables.get(locator).cloned()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn invalidate(&mut self, locator: &str) -> bool {
        self.tables.remove(locator).is_some()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    /// Parses `body` fetched from `locator` and caches the result.
    pub fn store_payload(&mut self, locator: &str, body: &[u8]) -> Result<Arc<BillingTable>> {
        let table = parse_billing_payload(body)
            .and_then(|table| accept_table(locator, table))
            .map_err(|e| as_load_error(locator, e))?;

        info!("Loaded {} billing rows from {}", table.len(), locator);

        let table = Arc::new(table);
        self.tables.insert(locator.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Returns the cached table for `locator`, calling `fetch` for the raw
    /// body only on a miss.
    pub fn get_or_fetch<F>(&mut self, locator: &str, fetch: F) -> Result<Arc<BillingTable>>
    where
        F: FnOnce(&str) -> Result<Vec<u8>>,
    {
        if let Some(table) = self.get(locator) {
            debug!("Cache hit for {}", locator);
            return Ok(table);
        }

        let body = fetch(locator).map_err(|e| {
            warn!("Fetch of {} failed: {}", locator, e);
            as_load_error(locator, e)
        })?;
        self.store_payload(locator, &body)
    }

    #[cfg(feature = "remote")]
    pub async fn get_or_fetch_remote(
        &mut self,
        source: &RemoteSource,
        locator: &str,
    ) -> Result<Arc<BillingTable>> {
        if let Some(table) = self.get(locator) {
            debug!("Cache hit for {}", locator);
            return Ok(table);
        }

        let body = source.fetch(locator).await.map_err(|e| {
            warn!("Fetch of {} failed: {}", locator, e);
            e
        })?;
        self.store_payload(locator, &body)
    }
}

/// HTTP access to the billing endpoint.
#[cfg(feature = "remote")]
#[derive(Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
}

#[cfg(feature = "remote")]
impl RemoteSource {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, locator: &str) -> Result<Vec<u8>> {
        let load_error = |reason: String| DashboardError::LoadError {
            locator: locator.to_string(),
            reason,
        };

        let res = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| load_error(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let error_text = res.text().await.unwrap_or_default();
            return Err(load_error(format!("status {}: {}", status, error_text)));
        }

        let body = res.bytes().await.map_err(|e| load_error(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;

    const ONE_ROW: &[u8] = br#"[{"billDate": "02-01-2024", "orderDepartment": "Cardiology", "net": 10}]"#;

    fn january() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_locator_fills_every_placeholder() {
        let locator = build_locator(&DashboardConfig::default(), &january()).unwrap();
        assert_eq!(
            locator,
            "http://192.168.15.3/NewHIS/api/his/Revenu_dashboard?FromDate=2024-01-01&ToDate=2024-01-31&Pattype=ALL&IVF_flg=0"
        );
    }

    #[test]
    fn test_build_locator_rejects_bad_template() {
        let config = DashboardConfig {
            source_template: "http://his.local/rev?ToDate={to}".to_string(),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            build_locator(&config, &january()),
            Err(DashboardError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_identical_locator_is_fetched_once() {
        let mut cache = TableCache::new();
        let calls = Cell::new(0);
        let fetch = |_: &str| {
            calls.set(calls.get() + 1);
            Ok(ONE_ROW.to_vec())
        };

        let first = cache.get_or_fetch("http://his/a", fetch).unwrap();
        let second = cache.get_or_fetch("http://his/a", fetch).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));

        cache.get_or_fetch("http://his/b", fetch).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_result_is_distinct_and_not_cached() {
        let mut cache = TableCache::new();

        let err = cache
            .get_or_fetch("http://his/empty", |_| Ok(b"[]".to_vec()))
            .unwrap_err();
        assert!(err.is_empty_result());

        let err = cache
            .get_or_fetch("http://his/undated", |_| {
                Ok(br#"[{"billDate": "not a date", "net": 5}]"#.to_vec())
            })
            .unwrap_err();
        assert!(err.is_empty_result());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_transport_and_payload_failures_are_load_errors() {
        let mut cache = TableCache::new();

        let err = cache
            .get_or_fetch("http://his/down", |_| {
                Err(DashboardError::IoError(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            })
            .unwrap_err();
        assert!(matches!(err, DashboardError::LoadError { .. }));
        assert!(!err.is_empty_result());

        let err = cache
            .get_or_fetch("http://his/garbled", |_| Ok(b"{not json".to_vec()))
            .unwrap_err();
        assert!(matches!(err, DashboardError::LoadError { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let mut cache = TableCache::new();
        let calls = Cell::new(0);
        let fetch = |_: &str| {
            calls.set(calls.get() + 1);
            Ok(ONE_ROW.to_vec())
        };

        cache.get_or_fetch("http://his/a", fetch).unwrap();
        assert!(cache.invalidate("http://his/a"));
        cache.get_or_fetch("http://his/a", fetch).unwrap();
        assert_eq!(calls.get(), 2);
    }
}
