//! Send command handler: dispatch, print, optionally save

use super::snippet;
use crate::cli::ExportFormat;
use crate::clients::HttpModelClient;
use crate::config::Config;
use crate::credentials::{CredentialResolver, EnvSource};
use crate::db::Store;
use crate::dispatch::export::{export_json, export_markdown};
use crate::dispatch::persist::{PersistStatus, Selection, persist_outcomes};
use crate::dispatch::{CancelToken, DispatchOptions, DispatchReport, Dispatcher, Outcome};
use crate::models::prompt::parse_tag_list;
use crate::models::setting::AUTO_SAVE;
use crate::models::{LanguageModel, PersistMode, Prompt};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct SendArgs {
    pub text: String,
    pub prompt_id: Option<i32>,
    pub tags: Option<String>,
    pub models: Vec<String>,
    pub save: bool,
    pub replace: bool,
    pub note: Option<String>,
    pub timeout: Option<u64>,
    pub export: Option<ExportFormat>,
}

async fn load_prompt(store: &Store, args: &SendArgs) -> anyhow::Result<Prompt> {
    if let Some(id) = args.prompt_id {
        return store
            .get_prompt(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Prompt {id} not found"));
    }

    let tags = args.tags.as_deref().map(parse_tag_list).unwrap_or_default();
    Ok(store.create_prompt(&args.text, &tags).await?)
}

fn print_report(report: &DispatchReport) {
    println!(
        "Responses for prompt {} ({:.1}s)",
        report.prompt_id,
        report.elapsed.as_secs_f64()
    );
    println!("{:-<70}", "");

    for o in report.by_name() {
        let marker = match &o.outcome {
            Outcome::Success { .. } => "✓",
            Outcome::Failure { .. } => "✗",
            Outcome::Timeout => "⏱",
            Outcome::Cancelled => "■",
        };
        println!(
            "{} [{}] {} ({} ms)",
            marker,
            o.model_id,
            o.model_name,
            o.elapsed.as_millis()
        );
        match o.outcome.response() {
            Some(response) => {
                for line in response.trim().lines() {
                    println!("  {line}");
                }
            }
            None => println!("  {}", o.outcome.error_message().unwrap_or_default()),
        }
        println!();
    }
}

async fn pick_models(store: &Store, names: &[String]) -> anyhow::Result<Vec<LanguageModel>> {
    if names.is_empty() {
        return Ok(store.list_active_models().await?);
    }

    let mut picked = Vec::with_capacity(names.len());
    for name in names {
        let model = store
            .get_model_by_name(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Model '{name}' not found"))?;
        picked.push(model);
    }
    Ok(picked)
}

pub async fn cmd_send(config: &Config, store: &Store, args: SendArgs) -> anyhow::Result<()> {
    // Models first: a new prompt is only stored once there is somewhere to send it.
    let models = pick_models(store, &args.models).await?;

    if models.is_empty() {
        println!("No active models to send to.");
        println!();
        println!("Add one with: chatlist model add <name> <url> <ENV_VAR_WITH_KEY>");
        return Ok(());
    }

    let prompt = load_prompt(store, &args).await?;

    let mut options = DispatchOptions::resolve(store, &config.dispatch).await?;
    if let Some(secs) = args.timeout.filter(|s| *s > 0) {
        options.per_model_timeout = Duration::from_secs(secs);
    }

    let source = if config.credentials.load_dotenv {
        EnvSource::with_dotenv(config.credentials.env_file.as_deref())
    } else {
        EnvSource
    };
    let client = HttpModelClient::from_config(&config.dispatch)?;
    let dispatcher = Dispatcher::new(Arc::new(client), CredentialResolver::new(source));

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling dispatch");
                cancel.cancel();
            }
        })
    };

    // Status lines go to stderr so exports can be piped.
    eprintln!(
        "Sending prompt {} to {} model(s): {}",
        prompt.id,
        models.len(),
        snippet(&prompt.text, 50)
    );
    let report = dispatcher.dispatch(&prompt, &models, options, &cancel).await;
    ctrl_c.abort();

    match args.export {
        Some(ExportFormat::Json) => {
            println!("{}", export_json(&report, &prompt).context("Failed to export JSON")?);
        }
        Some(ExportFormat::Md) => print!("{}", export_markdown(&report, &prompt)),
        None => print_report(&report),
    }

    let auto_save = store.setting_bool(AUTO_SAVE).await?.unwrap_or(false);
    if !(args.save || auto_save) {
        if report.successes().next().is_some() {
            eprintln!("Not saved. Re-run with --save or set {AUTO_SAVE}=true to keep responses.");
        }
        return Ok(());
    }

    let mode = if args.replace {
        PersistMode::Replace
    } else {
        PersistMode::Reject
    };
    let summary = persist_outcomes(
        store,
        &report,
        &Selection::AllSuccesses,
        mode,
        args.note.as_deref(),
    )
    .await?;

    for (model_id, status) in &summary.entries {
        if let PersistStatus::Rejected(e) = status {
            eprintln!("  Model {model_id} not saved: {e}");
        }
    }
    eprintln!(
        "Saved {} response(s), {} not saved",
        summary.saved(),
        summary.rejected() + summary.skipped()
    );

    Ok(())
}
