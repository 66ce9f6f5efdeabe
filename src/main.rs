use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod classify;
mod client;
mod controller;
mod dom;
mod form;
mod models;
mod page;
mod render;
mod report;

use client::HttpPredictionClient;
use controller::{ConsoleNotifier, SubmissionController};
use form::SurveyForm;
use models::{PredictionResult, SubmissionOutcome, SubmissionRecord};
use page::Document;

#[derive(Parser)]
#[command(name = "stress-survey")]
#[command(about = "Submit student wellbeing surveys and render stress/depression results", long_about = None)]
struct Cli {
    /// Origin of the prediction backend
    #[arg(long, global = true, default_value = "http://127.0.0.1:5000")]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one survey and write the rendered page
    Submit {
        #[arg(long)]
        student_id: String,
        #[arg(long, default_value = "")]
        text: String,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value = "")]
        study_time: String,
        #[arg(long, default_value = "")]
        social_media: String,
        #[arg(long, default_value = "")]
        sleep_hours: String,
        #[arg(long, default_value = "")]
        deadlines: String,
        /// Hide the emergency alert in the written page once it has been seen
        #[arg(long)]
        acknowledge: bool,
        #[arg(long, default_value = "result.html")]
        out: PathBuf,
    },
    /// Submit every survey in a CSV file and write a markdown report
    Batch {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Render a saved prediction response without contacting the backend
    Render {
        #[arg(long)]
        json: PathBuf,
        #[arg(long)]
        acknowledge: bool,
        #[arg(long, default_value = "result.html")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn field_text(document: &Document, id: &str) -> anyhow::Result<String> {
    Ok(document.element(id)?.text_content())
}

fn print_summary(student_id: &str, result: &PredictionResult, document: &Document) -> anyhow::Result<()> {
    println!(
        "{}: stress {} ({}), depression {} ({})",
        student_id,
        field_text(document, page::STRESS_SCORE)?,
        field_text(document, page::STRESS_LEVEL)?,
        field_text(document, page::DEPRESSION_SCORE)?,
        field_text(document, page::DEPRESSION_LEVEL)?
    );
    if let Some(sentiment) = result.text_sentiment {
        println!("Text sentiment score {sentiment:.2}");
    }
    let advisories = render::advisories(result);
    for message in advisories.counselor.iter().chain(advisories.proctor.iter()) {
        println!("! {message}");
    }
    if let Some(handle) = document.active_alert() {
        println!("EMERGENCY ({}): {}", handle.id(), render::CRISIS_CONTACTS.join("; "));
    } else if !document.emergency_alerts().is_empty() {
        println!("Emergency alert acknowledged.");
    }
    Ok(())
}

fn finish_page(mut document: Document, acknowledge: bool, out: &Path) -> anyhow::Result<Document> {
    if acknowledge && document.dismiss_emergency_alert() {
        info!("emergency alert acknowledged");
    }
    std::fs::write(out, document.to_html())
        .with_context(|| format!("failed to write {}", out.display()))?;
    Ok(document)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            student_id,
            text,
            image,
            study_time,
            social_media,
            sleep_hours,
            deadlines,
            acknowledge,
            out,
        } => {
            let client = HttpPredictionClient::new(&cli.base_url)
                .with_context(|| format!("invalid base url {}", cli.base_url))?;
            info!(endpoint = %client.endpoint(), "prediction backend");

            let document = Document::mount(page::skeleton())?;
            let mut controller = SubmissionController::new(client, ConsoleNotifier, document);
            let form = SurveyForm {
                student_id,
                text,
                image,
                study_time,
                social_media,
                sleep_hours,
                deadlines,
            };

            match controller.submit(&form).await? {
                SubmissionOutcome::Rendered(result) => {
                    let document = finish_page(controller.into_document(), acknowledge, &out)?;
                    print_summary(&form.student_id, &result, &document)?;
                    println!("Result page written to {}.", out.display());
                }
                SubmissionOutcome::Failed(_) => std::process::exit(1),
            }
        }
        Commands::Batch { csv, out } => {
            let forms = form::read_csv(&csv)
                .with_context(|| format!("failed to read surveys from {}", csv.display()))?;
            let client = HttpPredictionClient::new(&cli.base_url)
                .with_context(|| format!("invalid base url {}", cli.base_url))?;
            let document = Document::mount(page::skeleton())?;
            let mut controller = SubmissionController::new(client, ConsoleNotifier, document);

            let mut records = Vec::with_capacity(forms.len());
            for form in &forms {
                let outcome = controller.submit(form).await?;
                records.push(SubmissionRecord {
                    student_id: form.student_id.clone(),
                    outcome,
                });
            }

            let report = report::build_report(
                &csv.display().to_string(),
                chrono::Utc::now(),
                &records,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Submitted {} surveys from {}. Report written to {}.",
                records.len(),
                csv.display(),
                out.display()
            );
        }
        Commands::Render {
            json,
            acknowledge,
            out,
        } => {
            let body = std::fs::read(&json)
                .with_context(|| format!("failed to read {}", json.display()))?;
            let result = client::decode_result(&body)
                .with_context(|| format!("{} is not a prediction response", json.display()))?;

            let mut document = Document::mount(page::skeleton())?;
            render::render(&mut document, &result)?;
            let document = finish_page(document, acknowledge, &out)?;
            print_summary("result", &result, &document)?;
            println!("Result page written to {}.", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emergency_document() -> Document {
        let result = PredictionResult {
            stress_score: 0.8,
            depression_score: 0.2,
            stress_level: "Severe".to_string(),
            depression_level: "Normal".to_string(),
            alert_counselor: true,
            alert_proctor: true,
            recommendations: None,
            text_sentiment: None,
        };
        let mut document = Document::mount(page::skeleton()).unwrap();
        render::render(&mut document, &result).unwrap();
        document
    }

    fn temp_page() -> PathBuf {
        std::env::temp_dir().join(format!("stress-survey-{}.html", uuid::Uuid::new_v4()))
    }

    #[test]
    fn acknowledged_page_hides_alert() {
        let out = temp_page();
        let document = finish_page(emergency_document(), true, &out).unwrap();
        let html = std::fs::read_to_string(&out).unwrap();
        std::fs::remove_file(&out).unwrap();

        assert!(document.active_alert().is_none());
        assert!(document.emergency_alerts()[0].hidden);
        assert!(html.contains("emergency-alert\" style=\"display: none\""));
        assert!(html.contains("scrollIntoView({ behavior: 'smooth' })"));
    }

    #[test]
    fn unacknowledged_page_keeps_alert_visible() {
        let out = temp_page();
        let document = finish_page(emergency_document(), false, &out).unwrap();
        std::fs::remove_file(&out).unwrap();

        assert!(document.active_alert().is_some());
        assert!(!document.emergency_alerts()[0].hidden);
        assert_eq!(field_text(&document, page::STRESS_SCORE).unwrap(), "0.80");
    }
}
