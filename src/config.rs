//! Configuration types.
//!
//! Every constant the pipeline depends on (taxonomy, endpoint, sheet routing)
//! lives here and is passed into the components that need it.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Hard ceiling the Gmail list endpoint accepts for `maxResults`.
pub const MAX_FETCH_RESULTS: u32 = 500;

/// Default output file of a pipeline run.
pub const DEFAULT_OUTPUT_PATH: &str = "emails_classified.json";

/// Category used for records the model could not classify.
pub const UNCLASSIFIED: &str = "Unclassified";
/// Category of the sentinel produced when the endpoint returns an HTTP error.
pub const API_ERROR: &str = "API_ERROR";
/// Category of the sentinel produced when a 2xx body is not JSON.
pub const DECODE_ERROR: &str = "DECODE_ERROR";
/// Urgency attached to the transport-level sentinels.
pub const CRITICAL: &str = "Critical";

/// Closed label sets the model must choose from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxonomy {
    pub categories: Vec<String>,
    /// Ordered from most to least urgent.
    pub urgencies: Vec<String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            categories: [
                "IT technical issue",
                "Administrative request",
                "Access / authentication issue",
                "User support request",
                "Service bug or malfunction",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            urgencies: ["Critical", "High", "Moderate", "Low", "Trivial"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Classification endpoint configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Bearer credential. `None` short-circuits every call to a sentinel.
    pub api_key: Option<SecretString>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    pub taxonomy: Taxonomy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            model: "mistral-tiny".to_string(),
            timeout: Duration::from_secs(60),
            taxonomy: Taxonomy::default(),
        }
    }
}

impl ClassifierConfig {
    /// Build config from environment variables.
    ///
    /// `MISTRAL_API_KEY` may be absent; classification then yields the
    /// missing-credential sentinel for every message.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_key = std::env::var("MISTRAL_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from);

        let endpoint = std::env::var("TRIAGE_LLM_ENDPOINT").unwrap_or(defaults.endpoint);
        let model = std::env::var("TRIAGE_LLM_MODEL").unwrap_or(defaults.model);

        let timeout = match env_parse::<u64>("TRIAGE_HTTP_TIMEOUT_SECS")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "TRIAGE_HTTP_TIMEOUT_SECS".into(),
                    message: "must be greater than zero".into(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };

        Ok(Self {
            api_key,
            endpoint,
            model,
            timeout,
            taxonomy: defaults.taxonomy,
        })
    }
}

/// Knobs for a single pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Upper bound on fetched messages; clamped to [`MAX_FETCH_RESULTS`].
    pub max_results: u32,
    /// Classification requests allowed in flight at once.
    pub classify_concurrency: usize,
    pub output_path: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_results: MAX_FETCH_RESULTS,
            classify_concurrency: 4,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl PipelineSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_results = env_parse::<u32>("TRIAGE_MAX_RESULTS")?.unwrap_or(defaults.max_results);

        let classify_concurrency = match env_parse::<usize>("TRIAGE_CLASSIFY_CONCURRENCY")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "TRIAGE_CLASSIFY_CONCURRENCY".into(),
                    message: "must be at least 1".into(),
                });
            }
            Some(n) => n,
            None => defaults.classify_concurrency,
        };

        let output_path = std::env::var("TRIAGE_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_path);

        Ok(Self {
            max_results,
            classify_concurrency,
            output_path,
        })
    }
}

/// Location of the locally stored Google OAuth token.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub token_path: PathBuf,
}

impl GoogleConfig {
    pub fn from_env() -> Self {
        Self {
            token_path: std::env::var("TRIAGE_GOOGLE_TOKEN")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("token.json")),
        }
    }
}

/// How classified emails are routed into the spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub spreadsheet_id: String,
    /// Category → sheet name. Order decides sheet creation order.
    pub routes: Vec<(String, String)>,
    /// Sheet for categories absent from `routes`.
    pub fallback_sheet: String,
    pub header: [String; 3],
}

impl Default for SheetLayout {
    fn default() -> Self {
        let errors_sheet = "Classification Errors".to_string();

        let mut routes: Vec<(String, String)> = Taxonomy::default()
            .categories
            .into_iter()
            .map(|c| (c.clone(), c))
            .collect();
        for sentinel in [API_ERROR, DECODE_ERROR, UNCLASSIFIED] {
            routes.push((sentinel.to_string(), errors_sheet.clone()));
        }

        Self {
            spreadsheet_id: "12U1O2_Q4I5E0ZfsN0Vc0W67zRmjZfZO7Wb8pxoo_rmg".to_string(),
            routes,
            fallback_sheet: errors_sheet,
            header: ["Sujet".into(), "Urgence".into(), "Synthèse".into()],
        }
    }
}

impl SheetLayout {
    pub fn from_env() -> Self {
        let mut layout = Self::default();
        if let Ok(id) = std::env::var("TRIAGE_SPREADSHEET_ID")
            && !id.trim().is_empty()
        {
            layout.spreadsheet_id = id;
        }
        layout
    }

    /// Target sheet for a category, falling back when unmapped.
    pub fn sheet_for(&self, category: &str) -> &str {
        self.routes
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, sheet)| sheet.as_str())
            .unwrap_or(&self.fallback_sheet)
    }

    /// Distinct route targets in first-appearance order.
    pub fn required_sheets(&self) -> Vec<String> {
        let mut sheets: Vec<String> = Vec::new();
        for (_, sheet) in &self.routes {
            if !sheets.contains(sheet) {
                sheets.push(sheet.clone());
            }
        }
        if !sheets.contains(&self.fallback_sheet) {
            sheets.push(self.fallback_sheet.clone());
        }
        sheets
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_taxonomy_has_five_of_each() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.categories.len(), 5);
        assert_eq!(
            taxonomy.urgencies,
            vec!["Critical", "High", "Moderate", "Low", "Trivial"]
        );
    }

    #[test]
    fn sheet_for_maps_sentinels_to_error_sheet() {
        let layout = SheetLayout::default();
        assert_eq!(layout.sheet_for(API_ERROR), "Classification Errors");
        assert_eq!(layout.sheet_for(DECODE_ERROR), "Classification Errors");
        assert_eq!(layout.sheet_for(UNCLASSIFIED), "Classification Errors");
        assert_eq!(
            layout.sheet_for("Administrative request"),
            "Administrative request"
        );
    }

    #[test]
    fn sheet_for_unknown_category_uses_fallback() {
        let layout = SheetLayout::default();
        assert_eq!(layout.sheet_for("Something else"), "Classification Errors");
        assert_eq!(layout.sheet_for(""), "Classification Errors");
    }

    #[test]
    fn required_sheets_are_distinct_and_ordered() {
        let layout = SheetLayout::default();
        let sheets = layout.required_sheets();
        assert_eq!(sheets.len(), 6);
        assert_eq!(sheets[0], "IT technical issue");
        assert_eq!(sheets[5], "Classification Errors");
    }

    #[test]
    fn env_parse_missing_key_is_none() {
        let parsed = env_parse::<u32>("TRIAGE_TEST_SURELY_UNSET_KEY").unwrap();
        assert!(parsed.is_none());
    }
}
