//! Google bearer-token session.
//!
//! Reads a token file in the format written by Python's google-auth
//! (`Credentials.to_json()`) and refreshes it when expired. There is no
//! consent flow here: the token file must already exist.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AuthError;

/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth2 token payload persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleToken {
    /// The access token (google-auth writes this as "token").
    #[serde(alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// ISO 8601 expiry.
    #[serde(default)]
    pub expiry: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl GoogleToken {
    /// Parsed expiry, if present and well-formed.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// True when the recorded expiry is in the past (with skew).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at()
            .is_some_and(|at| at <= now + chrono::Duration::seconds(EXPIRY_SKEW_SECS))
    }
}

/// A ready-to-use bearer credential.
#[derive(Clone)]
pub struct GoogleSession {
    access_token: SecretString,
}

impl std::fmt::Debug for GoogleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSession").finish_non_exhaustive()
    }
}

impl GoogleSession {
    pub fn new(access_token: SecretString) -> Self {
        Self { access_token }
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Load the token file, refreshing (and re-saving) it when expired.
    pub async fn from_token_file(
        client: &reqwest::Client,
        path: &Path,
    ) -> Result<Self, AuthError> {
        let token = load_token(path)?;

        let needs_refresh = token.expiry.is_none() || token.is_expired_at(Utc::now());
        if !needs_refresh {
            return Ok(Self::new(SecretString::from(token.token)));
        }

        match token.refresh_token.as_deref() {
            Some(refresh_token) => {
                let refreshed = match refresh_access_token(client, &token, refresh_token).await {
                    Ok(refreshed) => refreshed,
                    // Without a recorded expiry the stored token may still be live.
                    Err(e) if token.expiry.is_none() => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "Token refresh failed, using the stored access token"
                        );
                        return Ok(Self::new(SecretString::from(token.token)));
                    }
                    Err(e) => return Err(e),
                };
                if let Err(e) = save_token(path, &refreshed) {
                    warn!(path = %path.display(), error = %e, "Failed to persist refreshed token");
                }
                Ok(Self::new(SecretString::from(refreshed.token)))
            }
            None if token.expiry.is_some() => Err(AuthError::Expired),
            None => Ok(Self::new(SecretString::from(token.token))),
        }
    }
}

/// Read and parse a token file.
pub fn load_token(path: &Path) -> Result<GoogleToken, AuthError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AuthError::TokenNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(AuthError::Io(e)),
    };

    let token: GoogleToken =
        serde_json::from_str(&raw).map_err(|e| AuthError::InvalidToken {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if token.token.trim().is_empty() {
        return Err(AuthError::InvalidToken {
            path: path.to_path_buf(),
            reason: "empty access token".into(),
        });
    }

    Ok(token)
}

fn save_token(path: &Path, token: &GoogleToken) -> Result<(), AuthError> {
    let json = serde_json::to_string_pretty(token).map_err(|e| AuthError::InvalidToken {
        path: PathBuf::from(path),
        reason: e.to_string(),
    })?;
    std::fs::write(path, json)?;
    Ok(())
}

async fn refresh_access_token(
    client: &reqwest::Client,
    token: &GoogleToken,
    refresh_token: &str,
) -> Result<GoogleToken, AuthError> {
    let mut form = vec![
        ("client_id", token.client_id.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    if let Some(secret) = token.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let resp = client.post(&token.token_uri).form(&form).send().await?;
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(AuthError::RefreshFailed(format!("HTTP {status}: {body}")));
    }

    let parsed: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AuthError::RefreshFailed(format!("invalid refresh response: {e}")))?;
    let access_token = parsed["access_token"]
        .as_str()
        .ok_or_else(|| AuthError::RefreshFailed("no access_token in response".into()))?;
    let expires_in = parsed["expires_in"].as_i64().unwrap_or(3600);

    let mut refreshed = token.clone();
    refreshed.token = access_token.to_string();
    refreshed.expiry = Some((Utc::now() + chrono::Duration::seconds(expires_in)).to_rfc3339());

    info!(expires_in, "Refreshed Google access token");
    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_once;

    #[test]
    fn parses_google_auth_format() {
        let json = r#"{
            "token": "ya29.abc",
            "refresh_token": "1//r",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "s",
            "scopes": ["https://www.googleapis.com/auth/gmail.readonly"],
            "expiry": "2030-01-01T00:00:00.000000Z"
        }"#;
        let token: GoogleToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token, "ya29.abc");
        assert!(!token.is_expired_at(Utc::now()));
    }

    #[test]
    fn accepts_access_token_alias() {
        let token: GoogleToken =
            serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.token_uri, "https://oauth2.googleapis.com/token");
        assert!(token.expiry.is_none());
    }

    #[test]
    fn past_expiry_is_expired() {
        let token: GoogleToken = serde_json::from_str(
            r#"{"token": "abc", "expiry": "2020-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(token.is_expired_at(Utc::now()));
    }

    #[test]
    fn load_missing_file_is_token_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load_token(&path), Err(AuthError::TokenNotFound(_))));
    }

    #[test]
    fn load_garbage_is_invalid_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load_token(&path),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[tokio::test]
    async fn expired_token_without_refresh_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{"token": "abc", "expiry": "2020-01-01T00:00:00Z"}"#).unwrap();

        let client = reqwest::Client::new();
        let result = GoogleSession::from_token_file(&client, &path).await;
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[tokio::test]
    async fn valid_token_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{"token": "abc", "expiry": "2099-01-01T00:00:00Z"}"#).unwrap();

        let client = reqwest::Client::new();
        let session = GoogleSession::from_token_file(&client, &path).await.unwrap();
        assert_eq!(session.access_token(), "abc");
    }

    fn write_token(path: &Path, token_uri: &str, expiry: Option<&str>) {
        let mut json = serde_json::json!({
            "token": "ya29.stale",
            "refresh_token": "1//r",
            "token_uri": token_uri,
            "client_id": "id.apps.googleusercontent.com",
        });
        if let Some(expiry) = expiry {
            json["expiry"] = expiry.into();
        }
        std::fs::write(path, json.to_string()).unwrap();
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_saved() {
        let (base, server) = serve_once(
            200,
            r#"{"access_token": "ya29.fresh", "expires_in": 3599, "token_type": "Bearer"}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, &format!("{base}/token"), Some("2020-01-01T00:00:00Z"));

        let client = reqwest::Client::new();
        let session = GoogleSession::from_token_file(&client, &path).await.unwrap();
        assert_eq!(session.access_token(), "ya29.fresh");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /token "));
        assert!(request.contains("grant_type=refresh_token"));
        assert!(request.contains("refresh_token=1%2F%2Fr"));

        let saved = load_token(&path).unwrap();
        assert_eq!(saved.token, "ya29.fresh");
        assert_eq!(saved.refresh_token.as_deref(), Some("1//r"));
        assert!(saved.expires_at().is_some_and(|at| at > Utc::now()));
        assert!(!saved.is_expired_at(Utc::now()));
    }

    #[tokio::test]
    async fn refresh_failure_without_expiry_keeps_stored_token() {
        let (base, server) = serve_once(400, r#"{"error": "invalid_grant"}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, &format!("{base}/token"), None);

        let client = reqwest::Client::new();
        let session = GoogleSession::from_token_file(&client, &path).await.unwrap();
        assert_eq!(session.access_token(), "ya29.stale");
        server.await.unwrap();

        let saved = load_token(&path).unwrap();
        assert_eq!(saved.token, "ya29.stale");
        assert!(saved.expiry.is_none());
    }

    #[tokio::test]
    async fn refresh_failure_on_expired_token_is_fatal() {
        let (base, server) = serve_once(400, r#"{"error": "invalid_grant"}"#).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_token(&path, &format!("{base}/token"), Some("2020-01-01T00:00:00Z"));

        let client = reqwest::Client::new();
        let result = GoogleSession::from_token_file(&client, &path).await;
        server.await.unwrap();

        match result {
            Err(AuthError::RefreshFailed(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected RefreshFailed, got {other:?}"),
        }
    }
}
