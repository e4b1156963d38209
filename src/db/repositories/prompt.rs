use crate::db::clock::MonotonicClock;
use crate::entities::{prelude::*, prompts, results};
use crate::error::{StoreError, StoreResult};
use crate::models::prompt::{Prompt, PromptSort, normalize_tags};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select, Set,
    TransactionTrait,
};
use tracing::{debug, info};

/// Repository for prompt operations
pub struct PromptRepository {
    conn: DatabaseConnection,
    clock: MonotonicClock,
}

impl PromptRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, clock: MonotonicClock) -> Self {
        Self { conn, clock }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(m: prompts::Model) -> StoreResult<Prompt> {
        let tags = match m.tags.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };

        Ok(Prompt {
            id: m.id,
            created_at: m.created_at,
            text: m.prompt,
            tags,
        })
    }

    fn map_all(rows: Vec<prompts::Model>) -> StoreResult<Vec<Prompt>> {
        rows.into_iter().map(Self::map_model).collect()
    }

    fn encode_tags(tags: &[String]) -> StoreResult<Option<String>> {
        if tags.is_empty() {
            Ok(None)
        } else {
            Ok(Some(serde_json::to_string(tags)?))
        }
    }

    fn sorted(query: Select<Prompts>, sort: PromptSort) -> Select<Prompts> {
        match sort {
            PromptSort::NewestFirst => query
                .order_by_desc(prompts::Column::CreatedAt)
                .order_by_desc(prompts::Column::Id),
            PromptSort::OldestFirst => query
                .order_by_asc(prompts::Column::CreatedAt)
                .order_by_asc(prompts::Column::Id),
            PromptSort::Id => query.order_by_asc(prompts::Column::Id),
        }
    }

    // ========================================================================
    // Prompt Operations
    // ========================================================================

    pub async fn create(&self, text: &str, tags: &[String]) -> StoreResult<Prompt> {
        if text.trim().is_empty() {
            return Err(StoreError::invalid("Prompt text must not be empty"));
        }

        let tags = normalize_tags(tags);
        let created_at = self.clock.stamp();

        let active_model = prompts::ActiveModel {
            created_at: Set(created_at.clone()),
            prompt: Set(text.to_string()),
            tags: Set(Self::encode_tags(&tags)?),
            ..Default::default()
        };

        let res = Prompts::insert(active_model).exec(&self.conn).await?;
        info!(prompt_id = res.last_insert_id, "Saved prompt");

        Ok(Prompt {
            id: res.last_insert_id,
            created_at,
            text: text.to_string(),
            tags,
        })
    }

    pub async fn get(&self, id: i32) -> StoreResult<Option<Prompt>> {
        let row = Prompts::find_by_id(id).one(&self.conn).await?;
        row.map(Self::map_model).transpose()
    }

    pub async fn list(&self, sort: PromptSort) -> StoreResult<Vec<Prompt>> {
        let rows = Self::sorted(Prompts::find(), sort)
            .all(&self.conn)
            .await?;
        Self::map_all(rows)
    }

    pub async fn search(&self, query: &str, include_tags: bool) -> StoreResult<Vec<Prompt>> {
        let mut condition = Condition::any().add(prompts::Column::Prompt.contains(query));
        if include_tags {
            condition = condition.add(prompts::Column::Tags.contains(query));
        }

        let rows = Self::sorted(Prompts::find().filter(condition), PromptSort::NewestFirst)
            .all(&self.conn)
            .await?;
        Self::map_all(rows)
    }

    /// Prompts carrying at least one of `tags` as an exact label.
    pub async fn search_by_tags(&self, tags: &[String]) -> StoreResult<Vec<Prompt>> {
        let wanted = normalize_tags(tags);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        // Narrow with LIKE on the encoded label, then match exactly.
        let mut condition = Condition::any();
        for tag in &wanted {
            condition = condition.add(prompts::Column::Tags.contains(serde_json::to_string(tag)?));
        }

        let rows = Self::sorted(Prompts::find().filter(condition), PromptSort::NewestFirst)
            .all(&self.conn)
            .await?;

        Ok(Self::map_all(rows)?
            .into_iter()
            .filter(|p| p.tags.iter().any(|t| wanted.contains(t)))
            .collect())
    }

    pub async fn update_tags(&self, id: i32, tags: &[String]) -> StoreResult<Prompt> {
        let tags = normalize_tags(tags);

        let result = Prompts::update_many()
            .col_expr(
                prompts::Column::Tags,
                sea_orm::sea_query::Expr::value(Self::encode_tags(&tags)?),
            )
            .filter(prompts::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::not_found("Prompt", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Prompt", id))
    }

    /// Deletes the prompt together with its results in one transaction.
    pub async fn delete(&self, id: i32) -> StoreResult<u64> {
        let txn = self.conn.begin().await?;

        let removed_results = Results::delete_many()
            .filter(results::Column::PromptId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;

        let removed = Prompts::delete_by_id(id).exec(&txn).await?;
        if removed.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::not_found("Prompt", id));
        }

        txn.commit().await?;
        debug!(prompt_id = id, removed_results, "Deleted prompt");
        Ok(removed_results)
    }
}
