//! The classified-emails file: one JSON array, written once per run.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::OutputError;
use crate::pipeline::types::ClassifiedEmail;

/// Serialize the whole run as a 4-space indented UTF-8 JSON array.
///
/// Non-ASCII text is written as-is, never `\u`-escaped.
pub fn write_classified(path: &Path, emails: &[ClassifiedEmail]) -> Result<(), OutputError> {
    let mut buf = Vec::with_capacity(emails.len() * 256);
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    emails
        .serialize(&mut ser)
        .map_err(|e| OutputError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    std::fs::write(path, buf).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a previously written classified-emails file.
///
/// Missing keys in a record default to empty strings.
pub fn read_classified(path: &Path) -> Result<Vec<ClassifiedEmail>, OutputError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OutputError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(OutputError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&raw).map_err(|e| OutputError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ClassificationResult;

    #[test]
    fn written_file_is_indented_and_keeps_accents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let emails = vec![ClassifiedEmail::new(
            "Accès refusé",
            ClassificationResult::new("Access / authentication issue", "High", "Compte bloqué"),
        )];

        write_classified(&path, &emails).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n    {\n        \"categorie\""));
        assert!(text.contains("Accès refusé"));
        assert!(!text.contains("\\u"));
        assert_eq!(read_classified(&path).unwrap(), emails);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_classified(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(OutputError::NotFound(_))));
    }

    #[test]
    fn read_non_array_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"subject": "not a list"}"#).unwrap();
        assert!(matches!(
            read_classified(&path),
            Err(OutputError::Invalid { .. })
        ));
    }
}
