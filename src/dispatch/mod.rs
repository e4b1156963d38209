//! Concurrent fan-out of one prompt to many model endpoints.
//!
//! Every model gets its own tokio task with its own timeout, so a slow or
//! failing endpoint only ever affects its own outcome. The coordinator waits
//! for all tasks, the overall deadline, or cancellation, whichever comes
//! first, and always hands back exactly one outcome per distinct model.

pub mod cancel;
pub mod export;
pub mod outcome;
pub mod persist;

use crate::clients::ModelClient;
use crate::config::DispatchConfig;
use crate::credentials::CredentialResolver;
use crate::db::Store;
use crate::error::StoreResult;
use crate::models::setting::{OVERALL_DEADLINE_SECONDS, REQUEST_TIMEOUT_SECONDS};
use crate::models::{LanguageModel, Prompt};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

pub use cancel::CancelToken;
pub use outcome::{DispatchReport, FailureKind, ModelOutcome, Outcome};

const PROMPT_LOG_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub per_model_timeout: Duration,
    pub overall_deadline: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

impl DispatchOptions {
    #[must_use]
    pub const fn new(per_model_timeout: Duration, overall_deadline: Duration) -> Self {
        Self {
            per_model_timeout,
            overall_deadline,
        }
    }

    #[must_use]
    pub const fn from_config(config: &DispatchConfig) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_seconds),
            Duration::from_secs(config.overall_deadline_seconds),
        )
    }

    /// Config defaults with the timeout settings stored in the database on top.
    pub async fn resolve(store: &Store, config: &DispatchConfig) -> StoreResult<Self> {
        let mut options = Self::from_config(config);

        match store.setting_u64(REQUEST_TIMEOUT_SECONDS).await? {
            Some(0) => warn!("Ignoring zero {REQUEST_TIMEOUT_SECONDS}"),
            Some(secs) => options.per_model_timeout = Duration::from_secs(secs),
            None => {}
        }
        match store.setting_u64(OVERALL_DEADLINE_SECONDS).await? {
            Some(0) => warn!("Ignoring zero {OVERALL_DEADLINE_SECONDS}"),
            Some(secs) => options.overall_deadline = Duration::from_secs(secs),
            None => {}
        }

        Ok(options)
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn ModelClient>,
    resolver: CredentialResolver,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn ModelClient>, resolver: CredentialResolver) -> Self {
        Self { client, resolver }
    }

    /// Lists the active models and dispatches the prompt to all of them.
    pub async fn dispatch_active(
        &self,
        store: &Store,
        prompt: &Prompt,
        options: DispatchOptions,
        cancel: &CancelToken,
    ) -> StoreResult<DispatchReport> {
        let models = store.list_active_models().await?;
        Ok(self.dispatch(prompt, &models, options, cancel).await)
    }

    /// Sends `prompt` to every model in `models` concurrently.
    ///
    /// Never fails as a whole: per-model problems become that model's
    /// outcome. Models listed twice are dispatched once. Nothing is persisted.
    pub async fn dispatch(
        &self,
        prompt: &Prompt,
        models: &[LanguageModel],
        options: DispatchOptions,
        cancel: &CancelToken,
    ) -> DispatchReport {
        let started = Instant::now();
        let text: Arc<str> = Arc::from(prompt.text.as_str());

        let mut unique: BTreeMap<i32, &LanguageModel> = BTreeMap::new();
        for model in models {
            unique.entry(model.id).or_insert(model);
        }

        info!(
            prompt_id = prompt.id,
            models = unique.len(),
            timeout_ms = options.per_model_timeout.as_millis() as u64,
            deadline_ms = options.overall_deadline.as_millis() as u64,
            "Dispatching prompt"
        );
        debug!(prompt = %truncate(&prompt.text, PROMPT_LOG_CHARS), "Prompt text");

        let mut outcomes: BTreeMap<i32, ModelOutcome> = BTreeMap::new();
        let mut pending: HashMap<i32, (String, AbortHandle)> = HashMap::new();
        let mut running = FuturesUnordered::new();

        if cancel.is_cancelled() {
            for (id, model) in unique {
                let outcome = finished(id, &model.name, Outcome::Cancelled, Duration::ZERO);
                outcomes.insert(id, outcome);
            }
            return assemble(prompt.id, outcomes, started);
        }

        for (id, model) in unique {
            let task = tokio::spawn(run_one(
                Arc::clone(&self.client),
                self.resolver.clone(),
                model.clone(),
                Arc::clone(&text),
                options.per_model_timeout,
            ));
            pending.insert(id, (model.name.clone(), task.abort_handle()));
            running.push(async move { (id, task.await) });
        }

        let deadline = tokio::time::sleep(options.overall_deadline);
        tokio::pin!(deadline);

        // Anything still pending when the loop exits is closed out below.
        let mut leftover = Outcome::Timeout;

        while !running.is_empty() {
            tokio::select! {
                biased;

                Some((id, joined)) = running.next() => {
                    let Some((name, _)) = pending.remove(&id) else {
                        continue;
                    };
                    let (outcome, elapsed) = match joined {
                        Ok(done) => done,
                        Err(e) if e.is_panic() => (
                            Outcome::Failure {
                                kind: FailureKind::Internal,
                                message: "model task panicked".to_string(),
                            },
                            started.elapsed(),
                        ),
                        Err(_) => (Outcome::Cancelled, started.elapsed()),
                    };
                    outcomes.insert(id, finished(id, &name, outcome, elapsed));
                }
                () = cancel.cancelled() => {
                    info!(
                        prompt_id = prompt.id,
                        pending = pending.len(),
                        "Dispatch cancelled"
                    );
                    leftover = Outcome::Cancelled;
                    break;
                }
                () = &mut deadline => {
                    warn!(
                        prompt_id = prompt.id,
                        pending = pending.len(),
                        "Overall deadline reached"
                    );
                    break;
                }
            }
        }

        let elapsed = started.elapsed();
        for (id, (name, handle)) in pending.drain() {
            handle.abort();
            outcomes.insert(id, finished(id, &name, leftover.clone(), elapsed));
        }

        let report = assemble(prompt.id, outcomes, started);
        info!(
            prompt_id = prompt.id,
            elapsed_ms = report.elapsed.as_millis() as u64,
            success = report.count("success"),
            failure = report.count("failure"),
            timeout = report.count("timeout"),
            cancelled = report.count("cancelled"),
            "Dispatch finished"
        );
        report
    }
}

/// One model's whole lifecycle: credential, request, timeout.
async fn run_one(
    client: Arc<dyn ModelClient>,
    resolver: CredentialResolver,
    model: LanguageModel,
    prompt: Arc<str>,
    per_model_timeout: Duration,
) -> (Outcome, Duration) {
    let started = Instant::now();

    let secret = match resolver.resolve(&model.credential_ref) {
        Ok(secret) => secret,
        Err(e) => {
            warn!(model_id = model.id, model = %model.name, "Credential unavailable: {e}");
            return (Outcome::from(e), started.elapsed());
        }
    };

    let send = client.send(&model, &prompt, &secret);
    let outcome = match tokio::time::timeout(per_model_timeout, send).await {
        Ok(Ok(response)) if response.trim().is_empty() => Outcome::Failure {
            kind: FailureKind::EmptyResponse,
            message: "Model returned an empty response".to_string(),
        },
        Ok(Ok(response)) => Outcome::Success { response },
        Ok(Err(e)) => Outcome::from(e),
        Err(_) => Outcome::Timeout,
    };

    (outcome, started.elapsed())
}

fn finished(model_id: i32, name: &str, outcome: Outcome, elapsed: Duration) -> ModelOutcome {
    match &outcome {
        Outcome::Success { response } => info!(
            model_id,
            model = %name,
            elapsed_ms = elapsed.as_millis() as u64,
            chars = response.chars().count(),
            outcome = outcome.label(),
            "Model answered"
        ),
        other => warn!(
            model_id,
            model = %name,
            elapsed_ms = elapsed.as_millis() as u64,
            outcome = other.label(),
            "Model did not answer: {}",
            other.error_message().unwrap_or_default()
        ),
    }

    ModelOutcome {
        model_id,
        model_name: name.to_string(),
        outcome,
        elapsed,
    }
}

fn assemble(
    prompt_id: i32,
    outcomes: BTreeMap<i32, ModelOutcome>,
    started: Instant,
) -> DispatchReport {
    DispatchReport {
        prompt_id,
        outcomes,
        elapsed: started.elapsed(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut cut: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        cut.push_str("...");
    }
    cut
}
