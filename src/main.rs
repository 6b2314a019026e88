use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use mail_triage::compare::{self, Comparison};
use mail_triage::config::{ClassifierConfig, GoogleConfig, PipelineSettings, SheetLayout};
use mail_triage::export::export_csv;
use mail_triage::google::GoogleSession;
use mail_triage::llm::Classifier;
use mail_triage::mail::GmailConnector;
use mail_triage::pipeline::Pipeline;
use mail_triage::pipeline::output::read_classified;
use mail_triage::sheets::{GoogleSheets, write_to_sheets};

#[derive(Parser, Debug)]
#[command(name = "mail-triage", version, about = "Classify inbox emails with an LLM.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, classify and save emails.
    Run {
        /// Output JSON file (overrides TRIAGE_OUTPUT).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Messages to fetch, capped at 500 (overrides TRIAGE_MAX_RESULTS).
        #[arg(long)]
        max_results: Option<u32>,
        /// Google token file (overrides TRIAGE_GOOGLE_TOKEN).
        #[arg(long)]
        token: Option<PathBuf>,
    },
    /// Convert a classified-emails file to CSV.
    ExportCsv {
        #[arg(long, default_value = "emails_classified.json")]
        input: PathBuf,
        #[arg(long, default_value = "emails_classified.csv")]
        output: PathBuf,
    },
    /// Score predictions against a labeled CSV.
    Compare {
        #[arg(long, default_value = "emails_classified.json")]
        predictions: PathBuf,
        #[arg(long, default_value = "ground_truth.csv")]
        ground_truth: PathBuf,
    },
    /// Write classified emails into per-category spreadsheet sheets.
    Sheets {
        #[arg(long, default_value = "emails_classified.json")]
        input: PathBuf,
        #[arg(long)]
        token: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    eprintln!("📬 mail-triage v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run {
            output,
            max_results,
            token,
        } => run(output, max_results, token).await,
        Command::ExportCsv { input, output } => {
            let rows = export_csv(&input, &output)
                .with_context(|| format!("exporting {}", input.display()))?;
            eprintln!("   Exported {} rows to {}", rows, output.display());
            Ok(())
        }
        Command::Compare {
            predictions,
            ground_truth,
        } => {
            let predicted = compare::load_predictions(&predictions)?;
            let truth = compare::load_ground_truth(&ground_truth)?;
            print_comparison(&compare::compare(&predicted, &truth));
            Ok(())
        }
        Command::Sheets { input, token } => sheets(input, token).await,
    }
}

async fn run(
    output: Option<PathBuf>,
    max_results: Option<u32>,
    token: Option<PathBuf>,
) -> anyhow::Result<()> {
    let classifier_config = ClassifierConfig::from_env()?;
    let mut settings = PipelineSettings::from_env()?;
    if let Some(path) = output {
        settings.output_path = path;
    }
    if let Some(n) = max_results {
        settings.max_results = n;
    }
    let token_path = token.unwrap_or(GoogleConfig::from_env().token_path);

    let classifier = Arc::new(Classifier::from_config(&classifier_config)?);
    if !classifier.has_credential() {
        eprintln!("   Warning: MISTRAL_API_KEY not set, every email will be Unclassified");
    }
    eprintln!("   Model: {}", classifier_config.model);
    eprintln!("   Token: {}", token_path.display());
    eprintln!("   Output: {}\n", settings.output_path.display());

    let client = reqwest::Client::new();
    let connector = Arc::new(GmailConnector::new(client, token_path));
    let output_path = settings.output_path.clone();

    let summary = Pipeline::new(connector, classifier, settings)
        .run()
        .await
        .context("pipeline run failed")?;

    if summary.written {
        eprintln!(
            "\n   {} emails classified ({} sentinel) → {}",
            summary.classified,
            summary.sentinels,
            output_path.display()
        );
    } else {
        eprintln!("\n   No emails to process, nothing written");
    }
    Ok(())
}

async fn sheets(input: PathBuf, token: Option<PathBuf>) -> anyhow::Result<()> {
    let emails = read_classified(&input)
        .with_context(|| format!("loading {}", input.display()))?;
    if emails.is_empty() {
        eprintln!("   No classified emails in {}, nothing to write", input.display());
        return Ok(());
    }
    let layout = SheetLayout::from_env();
    let token_path = token.unwrap_or(GoogleConfig::from_env().token_path);

    let client = reqwest::Client::new();
    let session = GoogleSession::from_token_file(&client, &token_path).await?;
    let store = GoogleSheets::new(client, session, layout.spreadsheet_id.clone());

    eprintln!("   Spreadsheet: {}", layout.spreadsheet_id);
    let summary = write_to_sheets(&store, &emails, &layout).await?;
    for (sheet, rows) in &summary.written {
        eprintln!("   -> {sheet}: {rows} rows");
    }
    for sheet in &summary.failed {
        eprintln!("   !! {sheet}: write failed");
    }
    Ok(())
}

fn print_comparison(result: &Comparison) {
    println!("Matches found: {}", result.matches.len());
    for m in &result.matches {
        println!(
            "  {:?} | {:?} | {} → {} | {} → {}",
            m.truth_subject,
            m.predicted_subject,
            m.truth_urgence,
            m.predicted_urgence,
            m.truth_categorie,
            m.predicted_categorie
        );
    }

    println!("\nConfusion matrix (urgence)\n{}", result.urgence.matrix);
    println!("Classification report (urgence)\n{}", result.urgence.report);
    println!("\nConfusion matrix (categorie)\n{}", result.categorie.matrix);
    println!("Classification report (categorie)\n{}", result.categorie.report);
}
