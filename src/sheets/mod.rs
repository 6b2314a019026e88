//! Spreadsheet sink: one sheet per category, rewritten in full each time.
//!
//! Only the metadata read is fatal. Sheet creation and per-sheet writes
//! log their failure and let the rest of the batch proceed.

pub mod google;

pub use google::GoogleSheets;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::{SheetLayout, UNCLASSIFIED};
use crate::error::SheetsError;
use crate::pipeline::ClassifiedEmail;

/// The handful of spreadsheet operations the sink needs.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Titles of the sheets currently in the document.
    async fn sheet_titles(&self) -> Result<Vec<String>, SheetsError>;

    /// Create the given sheets in one batch.
    async fn add_sheets(&self, titles: &[String]) -> Result<(), SheetsError>;

    /// Clear an A1-notation range.
    async fn clear_range(&self, range: &str) -> Result<(), SheetsError>;

    /// Write rows starting at an A1-notation anchor, interpreted as if typed.
    async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError>;
}

/// What a sheet write did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetsSummary {
    pub created: Vec<String>,
    /// Sheet name → data rows written (header excluded).
    pub written: Vec<(String, usize)>,
    pub failed: Vec<String>,
    pub skipped_empty: Vec<String>,
}

/// Group `emails` by target sheet and rewrite every non-empty sheet.
///
/// An empty batch touches nothing, not even the metadata.
pub async fn write_to_sheets(
    store: &dyn SheetStore,
    emails: &[ClassifiedEmail],
    layout: &SheetLayout,
) -> Result<SheetsSummary, SheetsError> {
    if emails.is_empty() {
        info!("No classified emails, spreadsheet left untouched");
        return Ok(SheetsSummary::default());
    }

    let required = layout.required_sheets();
    let mut summary = SheetsSummary {
        created: ensure_sheets(store, &required).await?,
        ..Default::default()
    };

    let mut grouped: HashMap<&str, Vec<Vec<String>>> = HashMap::new();
    for email in emails {
        let category = if email.categorie.is_empty() {
            UNCLASSIFIED
        } else {
            email.categorie.as_str()
        };
        grouped
            .entry(layout.sheet_for(category))
            .or_default()
            .push(vec![
                email.subject.clone(),
                email.urgence.clone(),
                email.synthese.clone(),
            ]);
    }

    info!(
        spreadsheet = %layout.spreadsheet_id,
        emails = emails.len(),
        "Writing classified emails to spreadsheet"
    );

    for sheet in &required {
        let Some(rows) = grouped.get(sheet.as_str()).filter(|r| !r.is_empty()) else {
            info!(sheet = %sheet, "No rows for sheet, skipped");
            summary.skipped_empty.push(sheet.clone());
            continue;
        };

        match write_sheet(store, sheet, &layout.header, rows).await {
            Ok(()) => {
                info!(sheet = %sheet, rows = rows.len(), "Sheet written");
                summary.written.push((sheet.clone(), rows.len()));
            }
            Err(e) => {
                error!(sheet = %sheet, error = %e, "Failed to write sheet, skipping");
                summary.failed.push(sheet.clone());
            }
        }
    }

    Ok(summary)
}

/// Create missing sheets. Returns the titles that were created.
async fn ensure_sheets(
    store: &dyn SheetStore,
    required: &[String],
) -> Result<Vec<String>, SheetsError> {
    let existing = store
        .sheet_titles()
        .await
        .map_err(|e| SheetsError::Metadata(e.to_string()))?;

    let missing: Vec<String> = required
        .iter()
        .filter(|s| !existing.contains(s))
        .cloned()
        .collect();
    if missing.is_empty() {
        info!("All required sheets already exist");
        return Ok(Vec::new());
    }

    match store.add_sheets(&missing).await {
        Ok(()) => {
            info!(sheets = ?missing, "Created missing sheets");
            Ok(missing)
        }
        Err(e) => {
            warn!(sheets = ?missing, error = %e, "Failed to create sheets, continuing");
            Ok(Vec::new())
        }
    }
}

async fn write_sheet(
    store: &dyn SheetStore,
    sheet: &str,
    header: &[String; 3],
    rows: &[Vec<String>],
) -> Result<(), SheetsError> {
    let mut values = Vec::with_capacity(rows.len() + 1);
    values.push(header.to_vec());
    values.extend_from_slice(rows);

    store.clear_range(&format!("'{sheet}'!A1:C")).await?;
    store.update_values(&format!("'{sheet}'!A1"), &values).await
}
