use crate::error::{DashboardError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SOURCE_TEMPLATE: &str = "http://192.168.15.3/NewHIS/api/his/Revenu_dashboard?FromDate={from}&ToDate={to}&Pattype={patient_type}&IVF_flg={ivf_flag}";

/// Lines of business this report never shows: liver transplantation and
/// hepatology services.
pub const DEFAULT_EXCLUDED_DEPARTMENTS: [&str; 3] = [
    "HPB Surgery, Liver And Kidney Transplantation",
    "HPB Surgery And Liver Transplantation",
    "Hepatology",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardConfig {
    #[schemars(
        description = "URL of the billing endpoint. {from} and {to} are replaced with YYYY-MM-DD dates; {patient_type} and {ivf_flag} are optional."
    )]
    pub source_template: String,

    #[schemars(description = "Value substituted for {patient_type}, e.g. ALL, OP or IP.")]
    pub patient_type: String,

    #[schemars(description = "Value substituted for {ivf_flag}; 0 leaves IVF billing out.")]
    pub ivf_flag: u8,

    #[schemars(
        description = "Department names dropped from every report before any other filter runs. Matched exactly."
    )]
    pub excluded_departments: Vec<String>,

    #[schemars(description = "Timeout for a single fetch of the billing endpoint, in seconds.")]
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_template: DEFAULT_SOURCE_TEMPLATE.to_string(),
            patient_type: "ALL".to_string(),
            ivf_flag: 0,
            excluded_departments: DEFAULT_EXCLUDED_DEPARTMENTS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            request_timeout_secs: 30,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{from}", "{to}"] {
            if !self.source_template.contains(placeholder) {
                return Err(DashboardError::InvalidTemplate(format!(
                    "'{}' is missing the {} placeholder",
                    self.source_template, placeholder
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(DashboardError::InvalidConfig(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DashboardConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
