//! Google Sheets v4 REST implementation of [`SheetStore`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::SheetsError;
use crate::google::GoogleSession;
use crate::sheets::SheetStore;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

pub struct GoogleSheets {
    client: reqwest::Client,
    session: GoogleSession,
    spreadsheet_id: String,
    base_url: String,
}

impl GoogleSheets {
    pub fn new(
        client: reqwest::Client,
        session: GoogleSession,
        spreadsheet_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            session,
            spreadsheet_id: spreadsheet_id.into(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn document_url(&self) -> String {
        format!("{}/{}", self.base_url, self.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/values/{}", self.document_url(), encode_range(range))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Percent-encode an A1 range for use as a path segment.
fn encode_range(range: &str) -> String {
    let mut out = String::with_capacity(range.len() * 3);
    for byte in range.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'!' | b':' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn sheet_titles(&self) -> Result<Vec<String>, SheetsError> {
        let resp = self
            .client
            .get(self.document_url())
            .bearer_auth(self.session.access_token())
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = Self::check(resp).await?.json().await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn add_sheets(&self, titles: &[String]) -> Result<(), SheetsError> {
        let requests: Vec<_> = titles
            .iter()
            .map(|t| json!({"addSheet": {"properties": {"title": t}}}))
            .collect();
        let resp = self
            .client
            .post(format!("{}:batchUpdate", self.document_url()))
            .bearer_auth(self.session.access_token())
            .json(&json!({ "requests": requests }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn clear_range(&self, range: &str) -> Result<(), SheetsError> {
        debug!(range, "Clearing range");
        let resp = self
            .client
            .post(format!("{}:clear", self.values_url(range)))
            .bearer_auth(self.session.access_token())
            .json(&json!({}))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn update_values(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SheetsError> {
        debug!(range, rows = rows.len(), "Updating values");
        let resp = self
            .client
            .put(self.values_url(range))
            .bearer_auth(self.session.access_token())
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "range": range, "values": rows }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
