use super::outcome::DispatchReport;
use crate::db::Store;
use crate::error::{StoreError, StoreResult};
use crate::models::{PersistMode, SavedResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Which outcomes of a report the caller wants kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    AllSuccesses,
    Models(BTreeSet<i32>),
}

impl Selection {
    pub fn models(ids: impl IntoIterator<Item = i32>) -> Self {
        Self::Models(ids.into_iter().collect())
    }
}

#[derive(Debug)]
pub enum PersistStatus {
    Saved(SavedResult),
    /// The model did not succeed, or was not part of the dispatch.
    Skipped(String),
    /// A constraint stopped this one write; the others went ahead.
    Rejected(StoreError),
}

#[derive(Debug, Default)]
pub struct PersistSummary {
    pub entries: BTreeMap<i32, PersistStatus>,
}

impl PersistSummary {
    #[must_use]
    pub fn saved(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Saved(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Skipped(_)))
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.count(|s| matches!(s, PersistStatus::Rejected(_)))
    }

    fn count(&self, pred: impl Fn(&PersistStatus) -> bool) -> usize {
        self.entries.values().filter(|s| pred(s)).count()
    }
}

/// Writes the selected successful outcomes of `report` to the store.
///
/// Each model is its own write. Duplicates and missing parents are recorded
/// per model; an unavailable store aborts the whole call.
pub async fn persist_outcomes(
    store: &Store,
    report: &DispatchReport,
    selection: &Selection,
    mode: PersistMode,
    note: Option<&str>,
) -> StoreResult<PersistSummary> {
    let ids: Vec<i32> = match selection {
        Selection::AllSuccesses => report.successes().map(|o| o.model_id).collect(),
        Selection::Models(ids) => ids.iter().copied().collect(),
    };

    let mut summary = PersistSummary::default();

    for model_id in ids {
        let Some(entry) = report.get(model_id) else {
            summary.entries.insert(
                model_id,
                PersistStatus::Skipped("model was not part of this dispatch".to_string()),
            );
            continue;
        };

        let Some(response) = entry.outcome.response() else {
            summary.entries.insert(
                model_id,
                PersistStatus::Skipped(format!("outcome was {}", entry.outcome.label())),
            );
            continue;
        };

        let status = match store
            .persist_result(report.prompt_id, model_id, response, note, mode)
            .await
        {
            Ok(saved) => PersistStatus::Saved(saved),
            Err(e) if e.is_constraint() || matches!(e, StoreError::InvalidArgument(_)) => {
                warn!(model_id, model = %entry.model_name, "Result not saved: {e}");
                PersistStatus::Rejected(e)
            }
            Err(e) => return Err(e),
        };
        summary.entries.insert(model_id, status);
    }

    info!(
        prompt_id = report.prompt_id,
        saved = summary.saved(),
        skipped = summary.skipped(),
        rejected = summary.rejected(),
        "Persisted dispatch outcomes"
    );

    Ok(summary)
}
