use super::outcome::DispatchReport;
use crate::models::Prompt;
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct ExportedReport<'a> {
    prompt_id: i32,
    prompt: &'a str,
    results: Vec<ExportedOutcome<'a>>,
}

#[derive(Serialize)]
struct ExportedOutcome<'a> {
    model_id: i32,
    model: &'a str,
    status: &'static str,
    response: Option<&'a str>,
    error: Option<String>,
    elapsed_ms: u64,
}

/// Pretty-printed JSON with one entry per model, in model-name order.
pub fn export_json(report: &DispatchReport, prompt: &Prompt) -> serde_json::Result<String> {
    let exported = ExportedReport {
        prompt_id: report.prompt_id,
        prompt: &prompt.text,
        results: report
            .by_name()
            .into_iter()
            .map(|o| ExportedOutcome {
                model_id: o.model_id,
                model: &o.model_name,
                status: o.outcome.label(),
                response: o.outcome.response(),
                error: o.outcome.error_message(),
                elapsed_ms: o.elapsed.as_millis() as u64,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&exported)
}

/// Markdown document with the prompt followed by one section per model.
#[must_use]
pub fn export_markdown(report: &DispatchReport, prompt: &Prompt) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Prompt {}\n", report.prompt_id);
    let _ = writeln!(out, "{}\n", prompt.text.trim());

    for o in report.by_name() {
        let _ = writeln!(out, "## {}\n", o.model_name);
        match o.outcome.response() {
            Some(response) => {
                let _ = writeln!(out, "{}\n", response.trim());
            }
            None => {
                let reason = o.outcome.error_message().unwrap_or_default();
                let _ = writeln!(out, "_No response: {reason}_\n");
            }
        }
    }

    out
}
