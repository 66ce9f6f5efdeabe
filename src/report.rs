use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::classify;
use crate::models::{SubmissionOutcome, SubmissionRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub submitted: usize,
    pub rendered: usize,
    pub failed: usize,
    pub emergencies: usize,
    pub counselor_alerts: usize,
    pub proctor_alerts: usize,
}

pub fn summarize(records: &[SubmissionRecord]) -> BatchSummary {
    let mut summary = BatchSummary {
        submitted: records.len(),
        ..BatchSummary::default()
    };

    for record in records {
        match &record.outcome {
            SubmissionOutcome::Rendered(result) => {
                summary.rendered += 1;
                if classify::is_emergency(result.stress_score, result.depression_score) {
                    summary.emergencies += 1;
                }
                if result.alert_counselor {
                    summary.counselor_alerts += 1;
                }
                if result.alert_proctor {
                    summary.proctor_alerts += 1;
                }
            }
            SubmissionOutcome::Failed(_) => summary.failed += 1,
        }
    }

    summary
}

pub fn build_report(source: &str, generated_at: DateTime<Utc>, records: &[SubmissionRecord]) -> String {
    let summary = summarize(records);
    let mut output = String::new();

    let _ = writeln!(output, "# Student Wellbeing Batch Report");
    let _ = writeln!(
        output,
        "Generated from {} at {}",
        source,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Surveys submitted: {}", summary.submitted);
    let _ = writeln!(output, "- Results received: {}", summary.rendered);
    let _ = writeln!(output, "- Failed submissions: {}", summary.failed);
    let _ = writeln!(output, "- Emergency alerts: {}", summary.emergencies);
    let _ = writeln!(output, "- Counselor advisories: {}", summary.counselor_alerts);
    let _ = writeln!(output, "- Proctor advisories: {}", summary.proctor_alerts);

    let mut results: Vec<_> = records
        .iter()
        .filter_map(|record| match &record.outcome {
            SubmissionOutcome::Rendered(result) => Some((record, result)),
            SubmissionOutcome::Failed(_) => None,
        })
        .collect();
    results.sort_by(|a, b| {
        let a_peak = a.1.stress_score.max(a.1.depression_score);
        let b_peak = b.1.stress_score.max(b.1.depression_score);
        b_peak
            .partial_cmp(&a_peak)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Results");

    if results.is_empty() {
        let _ = writeln!(output, "No results received.");
    } else {
        for (record, result) in results {
            let emergency = classify::is_emergency(result.stress_score, result.depression_score);
            let _ = writeln!(
                output,
                "- {}: stress {:.2} ({}, {}), depression {:.2} ({}, {}){}",
                record.student_id,
                result.stress_score,
                result.stress_level,
                classify::band(result.stress_score),
                result.depression_score,
                result.depression_level,
                classify::band(result.depression_score),
                if emergency { " **EMERGENCY**" } else { "" }
            );
        }
    }

    let failures: Vec<_> = records
        .iter()
        .filter_map(|record| match &record.outcome {
            SubmissionOutcome::Failed(message) => Some((record, message)),
            SubmissionOutcome::Rendered(_) => None,
        })
        .collect();

    if !failures.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Failures");
        for (record, message) in failures {
            let _ = writeln!(output, "- {}: {}", record.student_id, message);
        }
    }

    output
}
