//! JSON → CSV transcoding of a classified-emails file.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::ExportError;
use crate::pipeline::output::read_classified;

/// One CSV row. Field order is the column order.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: usize,
    categorie: &'a str,
    subject: &'a str,
    urgence: &'a str,
    synthese: &'a str,
}

/// Write `input` as CSV to `output` with a 1-based `id` column.
///
/// Returns the number of data rows written.
pub fn export_csv(input: &Path, output: &Path) -> Result<usize, ExportError> {
    let emails = read_classified(input)?;

    let mut writer = ::csv::Writer::from_path(output)?;
    for (index, email) in emails.iter().enumerate() {
        writer.serialize(CsvRow {
            id: index + 1,
            categorie: &email.categorie,
            subject: &email.subject,
            urgence: &email.urgence,
            synthese: &email.synthese,
        })?;
    }
    // An empty input still gets a header line.
    if emails.is_empty() {
        writer.write_record(["id", "categorie", "subject", "urgence", "synthese"])?;
    }
    writer.flush()?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows = emails.len(),
        "Exported classified emails to CSV"
    );
    Ok(emails.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OutputError;
    use crate::pipeline::output::write_classified;
    use crate::pipeline::types::{ClassificationResult, ClassifiedEmail};

    fn email(subject: &str, categorie: &str) -> ClassifiedEmail {
        ClassifiedEmail::new(
            subject,
            ClassificationResult::new(categorie, "Low", format!("about {subject}")),
        )
    }

    #[test]
    fn three_records_get_sequential_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.csv");
        let emails = vec![
            email("VPN down", "IT technical issue"),
            email("Holiday form", "Administrative request"),
            email("Password, again", "Access / authentication issue"),
        ];
        write_classified(&input, &emails).unwrap();

        let rows = export_csv(&input, &output).unwrap();
        assert_eq!(rows, 3);

        let mut reader = ::csv::Reader::from_path(&output).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["id", "categorie", "subject", "urgence", "synthese"]
        );

        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 3);
        for (i, (record, original)) in records.iter().zip(&emails).enumerate() {
            assert_eq!(&record[0], (i + 1).to_string());
            assert_eq!(&record[1], original.categorie);
            assert_eq!(&record[2], original.subject);
            assert_eq!(&record[3], original.urgence);
            assert_eq!(&record[4], original.synthese);
        }
    }

    #[test]
    fn missing_fields_export_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, r#"[{"subject": "bare"}]"#).unwrap();

        export_csv(&input, &output).unwrap();
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "id,categorie,subject,urgence,synthese\n1,,bare,,\n");
    }

    #[test]
    fn empty_input_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, "[]").unwrap();

        assert_eq!(export_csv(&input, &output).unwrap(), 0);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "id,categorie,subject,urgence,synthese\n");
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = export_csv(&dir.path().join("nope.json"), &dir.path().join("o.csv"));
        assert!(matches!(
            result,
            Err(ExportError::Input(OutputError::NotFound(_)))
        ));
    }
}
