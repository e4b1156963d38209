use crate::db::clock::MonotonicClock;
use crate::entities::{models, prelude::*, results};
use crate::error::{StoreError, StoreResult, Violation, violation};
use crate::models::model::{LanguageModel, ModelUpdate, NewModel, ProviderKind};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info};

/// Repository for model endpoint operations
pub struct ModelRepository {
    conn: DatabaseConnection,
    clock: MonotonicClock,
}

impl ModelRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, clock: MonotonicClock) -> Self {
        Self { conn, clock }
    }

    fn map_model(m: models::Model) -> LanguageModel {
        LanguageModel {
            id: m.id,
            name: m.name,
            api_url: m.api_url,
            credential_ref: m.credential_ref,
            is_active: m.is_active,
            provider: m.provider.as_deref().and_then(ProviderKind::parse),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    fn map_write_err(err: DbErr, name: &str) -> StoreError {
        match violation(&err) {
            Some(Violation::Unique) => StoreError::DuplicateName(name.to_string()),
            _ => err.into(),
        }
    }

    fn required(field: &str, value: &str) -> StoreResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(StoreError::invalid(format!("Model {field} must not be empty")));
        }
        Ok(trimmed.to_string())
    }

    fn validate_url(raw: &str) -> StoreResult<String> {
        let url = Self::required("URL", raw)?;
        let parsed = url::Url::parse(&url)
            .map_err(|e| StoreError::invalid(format!("Invalid model URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::invalid(format!(
                "Model URL must be http or https: {url}"
            )));
        }
        Ok(url)
    }

    pub async fn create(&self, new: &NewModel) -> StoreResult<LanguageModel> {
        let name = Self::required("name", &new.name)?;
        let api_url = Self::validate_url(&new.api_url)?;
        let credential_ref = Self::required("credential reference", &new.credential_ref)?;
        let now = self.clock.stamp();

        let active_model = models::ActiveModel {
            name: Set(name.clone()),
            api_url: Set(api_url),
            credential_ref: Set(credential_ref),
            is_active: Set(true),
            provider: Set(new.provider.as_ref().map(|p| p.label().to_string())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let res = Models::insert(active_model)
            .exec(&self.conn)
            .await
            .map_err(|e| Self::map_write_err(e, &name))?;

        info!(model_id = res.last_insert_id, model = %name, "Added model");

        self.get(res.last_insert_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Model", res.last_insert_id))
    }

    pub async fn get(&self, id: i32) -> StoreResult<Option<LanguageModel>> {
        let row = Models::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn get_by_name(&self, name: &str) -> StoreResult<Option<LanguageModel>> {
        let row = Models::find()
            .filter(models::Column::Name.eq(name))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn list(&self, include_inactive: bool) -> StoreResult<Vec<LanguageModel>> {
        let mut query = Models::find();
        if !include_inactive {
            query = query.filter(models::Column::IsActive.eq(true));
        }

        let rows = query
            .order_by_asc(models::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn search(&self, query: &str) -> StoreResult<Vec<LanguageModel>> {
        let rows = Models::find()
            .filter(
                Condition::any()
                    .add(models::Column::Name.contains(query))
                    .add(models::Column::Provider.contains(query)),
            )
            .order_by_asc(models::Column::Name)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn update(&self, id: i32, update: &ModelUpdate) -> StoreResult<LanguageModel> {
        let existing = Models::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("Model", id))?;

        let mut active: models::ActiveModel = existing.clone().into();
        let mut name = existing.name;

        if let Some(new_name) = &update.name {
            name = Self::required("name", new_name)?;
            active.name = Set(name.clone());
        }
        if let Some(api_url) = &update.api_url {
            active.api_url = Set(Self::validate_url(api_url)?);
        }
        if let Some(credential_ref) = &update.credential_ref {
            active.credential_ref = Set(Self::required("credential reference", credential_ref)?);
        }
        if let Some(provider) = &update.provider {
            active.provider = Set(provider.as_ref().map(|p| p.label().to_string()));
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(self.clock.stamp());

        let saved = active
            .update(&self.conn)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => StoreError::not_found("Model", id),
                other => Self::map_write_err(other, &name),
            })?;

        debug!(model_id = id, "Updated model");
        Ok(Self::map_model(saved))
    }

    /// Deletes the model together with its results in one transaction.
    pub async fn delete(&self, id: i32) -> StoreResult<u64> {
        let txn = self.conn.begin().await?;

        let removed_results = Results::delete_many()
            .filter(results::Column::ModelId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;

        let removed = Models::delete_by_id(id).exec(&txn).await?;
        if removed.rows_affected == 0 {
            txn.rollback().await?;
            return Err(StoreError::not_found("Model", id));
        }

        txn.commit().await?;
        info!(model_id = id, removed_results, "Deleted model");
        Ok(removed_results)
    }
}
