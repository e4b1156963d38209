use serde::{Deserialize, Serialize};

/// A persisted response of one model to one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedResult {
    pub id: i32,
    pub prompt_id: i32,
    pub model_id: i32,
    pub response: String,
    pub saved_at: String,
    pub note: Option<String>,
}

/// What to do when a result already exists for the (prompt, model) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistMode {
    /// Fail with `DuplicateResult` and keep the stored row.
    #[default]
    Reject,
    /// Overwrite response, timestamp and note of the stored row in place.
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub prompt_id: Option<i32>,
    pub model_id: Option<i32>,
}

impl ResultFilter {
    #[must_use]
    pub const fn for_prompt(prompt_id: i32) -> Self {
        Self {
            prompt_id: Some(prompt_id),
            model_id: None,
        }
    }

    #[must_use]
    pub const fn for_model(model_id: i32) -> Self {
        Self {
            prompt_id: None,
            model_id: Some(model_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSort {
    #[default]
    NewestFirst,
    OldestFirst,
    Id,
}
