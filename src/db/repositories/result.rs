use crate::db::clock::MonotonicClock;
use crate::entities::{prelude::*, results};
use crate::error::{StoreError, StoreResult, Violation, violation};
use crate::models::result::{PersistMode, ResultFilter, ResultSort, SavedResult};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::OnConflict,
};
use tracing::{debug, info};

/// Repository for saved model responses
pub struct ResultRepository {
    conn: DatabaseConnection,
    clock: MonotonicClock,
}

impl ResultRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, clock: MonotonicClock) -> Self {
        Self { conn, clock }
    }

    fn map_model(m: results::Model) -> SavedResult {
        SavedResult {
            id: m.id,
            prompt_id: m.prompt_id,
            model_id: m.model_id,
            response: m.response,
            saved_at: m.saved_at,
            note: m.notes,
        }
    }

    /// Works out which parent a foreign key failure was about.
    async fn missing_parent(&self, prompt_id: i32, model_id: i32) -> StoreError {
        match Prompts::find_by_id(prompt_id).one(&self.conn).await {
            Ok(None) => return StoreError::not_found("Prompt", prompt_id),
            Err(e) => return e.into(),
            Ok(Some(_)) => {}
        }
        StoreError::not_found("Model", model_id)
    }

    async fn map_write_err(&self, err: DbErr, prompt_id: i32, model_id: i32) -> StoreError {
        match violation(&err) {
            Some(Violation::Unique) => StoreError::DuplicateResult {
                prompt_id,
                model_id,
            },
            Some(Violation::ForeignKey) => self.missing_parent(prompt_id, model_id).await,
            None => err.into(),
        }
    }

    /// Stores a response for the (prompt, model) pair.
    ///
    /// The unique index on the pair is the duplicate check, so the write comes
    /// first and concurrent callers cannot both get past it. In `Replace` mode
    /// the existing row is overwritten by a single upsert and keeps its id.
    pub async fn persist(
        &self,
        prompt_id: i32,
        model_id: i32,
        response: &str,
        note: Option<&str>,
        mode: PersistMode,
    ) -> StoreResult<SavedResult> {
        if response.trim().is_empty() {
            return Err(StoreError::invalid("Response text must not be empty"));
        }

        let note = note.map(str::trim).filter(|n| !n.is_empty());
        let active_model = results::ActiveModel {
            prompt_id: Set(prompt_id),
            model_id: Set(model_id),
            response: Set(response.to_string()),
            saved_at: Set(self.clock.stamp()),
            notes: Set(note.map(str::to_string)),
            ..Default::default()
        };

        let txn = self.conn.begin().await?;

        let insert = Results::insert(active_model);
        let written = match mode {
            PersistMode::Reject => insert.exec_without_returning(&txn).await,
            PersistMode::Replace => {
                insert
                    .on_conflict(
                        OnConflict::columns([results::Column::PromptId, results::Column::ModelId])
                            .update_columns([
                                results::Column::Response,
                                results::Column::SavedAt,
                                results::Column::Notes,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await
            }
        };

        if let Err(err) = written {
            txn.rollback().await?;
            return Err(self.map_write_err(err, prompt_id, model_id).await);
        }

        let row = Results::find()
            .filter(results::Column::PromptId.eq(prompt_id))
            .filter(results::Column::ModelId.eq(model_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                StoreError::StorageUnavailable(format!(
                    "Result for prompt {prompt_id} and model {model_id} vanished after write"
                ))
            })?;

        txn.commit().await?;

        info!(
            prompt_id,
            model_id,
            result_id = row.id,
            replace = matches!(mode, PersistMode::Replace),
            "Saved result"
        );
        Ok(Self::map_model(row))
    }

    pub async fn get(&self, id: i32) -> StoreResult<Option<SavedResult>> {
        let row = Results::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn get_for(&self, prompt_id: i32, model_id: i32) -> StoreResult<Option<SavedResult>> {
        let row = Results::find()
            .filter(results::Column::PromptId.eq(prompt_id))
            .filter(results::Column::ModelId.eq(model_id))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn list(
        &self,
        filter: ResultFilter,
        sort: ResultSort,
    ) -> StoreResult<Vec<SavedResult>> {
        let mut query = Results::find();
        if let Some(prompt_id) = filter.prompt_id {
            query = query.filter(results::Column::PromptId.eq(prompt_id));
        }
        if let Some(model_id) = filter.model_id {
            query = query.filter(results::Column::ModelId.eq(model_id));
        }

        let query = match sort {
            ResultSort::NewestFirst => query
                .order_by_desc(results::Column::SavedAt)
                .order_by_desc(results::Column::Id),
            ResultSort::OldestFirst => query
                .order_by_asc(results::Column::SavedAt)
                .order_by_asc(results::Column::Id),
            ResultSort::Id => query.order_by_asc(results::Column::Id),
        };

        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn search(&self, query: &str) -> StoreResult<Vec<SavedResult>> {
        let rows = Results::find()
            .filter(
                Condition::any()
                    .add(results::Column::Response.contains(query))
                    .add(results::Column::Notes.contains(query)),
            )
            .order_by_desc(results::Column::SavedAt)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn delete(&self, id: i32) -> StoreResult<()> {
        let removed = Results::delete_by_id(id).exec(&self.conn).await?;
        if removed.rows_affected == 0 {
            return Err(StoreError::not_found("Result", id));
        }
        debug!(result_id = id, "Deleted result");
        Ok(())
    }
}
