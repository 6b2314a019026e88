//! Pipeline orchestrator: connect → fetch → classify each → persist.
//!
//! Only a failed session or a failed fetch aborts a run. Classification
//! failures arrive as sentinel results and never stop the loop.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::config::PipelineSettings;
use crate::error::PipelineError;
use crate::llm::Classifier;
use crate::mail::{self, EmailRecord, MailboxConnector};
use crate::pipeline::output::write_classified;
use crate::pipeline::types::{ClassificationResult, ClassifiedEmail, RunSummary};

pub struct Pipeline {
    connector: Arc<dyn MailboxConnector>,
    classifier: Arc<Classifier>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        connector: Arc<dyn MailboxConnector>,
        classifier: Arc<Classifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            connector,
            classifier,
            settings,
        }
    }

    /// Run the pipeline once.
    ///
    /// Returns `Ok` with `written == false` when the mailbox had nothing to
    /// classify; no output file is created in that case.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("triage_run", %run_id);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&self) -> Result<RunSummary, PipelineError> {
        info!("Opening mailbox session");
        let mailbox = self.connector.connect().await.map_err(|e| {
            error!(error = %e, "Mailbox session failed, aborting run");
            PipelineError::Session(e)
        })?;

        info!(max_results = self.settings.max_results, "Fetching emails");
        let emails = mail::fetch(mailbox.as_ref(), self.settings.max_results)
            .await
            .map_err(|e| {
                error!(error = %e, "Mailbox fetch failed, aborting run");
                PipelineError::Fetch(e)
            })?;
        info!(count = emails.len(), "Emails fetched");

        if emails.is_empty() {
            info!("No emails to process, nothing written");
            return Ok(RunSummary::default());
        }

        let results = self.classify_all(&emails).await;
        let sentinels = results.iter().filter(|r| r.is_sentinel()).count();
        let classified: Vec<ClassifiedEmail> = emails
            .iter()
            .zip(results)
            .map(|(email, result)| ClassifiedEmail::new(email.subject.clone(), result))
            .collect();

        write_classified(&self.settings.output_path, &classified)?;
        info!(
            path = %self.settings.output_path.display(),
            count = classified.len(),
            sentinels,
            "All emails processed and saved"
        );

        Ok(RunSummary {
            fetched: emails.len(),
            classified: classified.len(),
            sentinels,
            written: true,
        })
    }

    /// Classify with bounded concurrency; results come back in input order.
    async fn classify_all(&self, emails: &[EmailRecord]) -> Vec<ClassificationResult> {
        let width = self.settings.classify_concurrency.max(1);
        let total = emails.len();
        info!(total, width, "Classifying emails");

        stream::iter(emails.iter().enumerate())
            .map(|(index, email)| {
                let classifier = Arc::clone(&self.classifier);
                async move {
                    let result = classifier.classify(&email.subject, &email.body).await;
                    info!(
                        position = index + 1,
                        total,
                        subject = %email.subject,
                        categorie = %result.categorie,
                        urgence = %result.urgence,
                        synthese = %result.synthese,
                        "Email classified"
                    );
                    result
                }
            })
            .buffered(width)
            .collect()
            .await
    }
}
