use crate::error::{StoreError, StoreResult};
use crate::models::model::{LanguageModel, ModelUpdate, NewModel};
use crate::models::prompt::{Prompt, PromptSort};
use crate::models::result::{PersistMode, ResultFilter, ResultSort, SavedResult};
use crate::models::setting::{Setting, parse_flag};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub mod clock;
pub mod migrator;
pub mod repositories;

use clock::MonotonicClock;

/// Handle to the embedded database.
///
/// Opened once at startup, cloned into whatever needs it, and closed at
/// shutdown. Clones share the connection pool and the timestamp clock.
#[derive(Clone)]
pub struct Store {
    pub(crate) conn: DatabaseConnection,
    clock: MonotonicClock,
}

impl Store {
    pub async fn open(db_url: &str) -> StoreResult<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> StoreResult<Self> {
        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
            {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::StorageUnavailable(format!(
                        "Cannot create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str).map_err(|e| {
                    StoreError::StorageUnavailable(format!(
                        "Cannot create database file {path_str}: {e}"
                    ))
                })?;
            }
        }

        // Every pooled connection to ":memory:" would be its own database.
        let max_connections = if in_memory { 1 } else { max_connections };
        let min_connections = min_connections.min(max_connections);

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        let store = Self {
            conn,
            clock: MonotonicClock::new(),
        };

        store.ensure_schema().await?;

        info!(
            "Database connected & schema ensured (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(store)
    }

    /// Creates missing tables and indexes. Safe to call on every start; applied
    /// migrations are recorded and never re-run, and none of them drop data.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        use sea_orm_migration::MigratorTrait;

        migrator::Migrator::up(&self.conn, None)
            .await
            .map_err(|e| StoreError::StorageUnavailable(format!("Schema migration failed: {e}")))
    }

    pub async fn ping(&self) -> StoreResult<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn close(self) -> StoreResult<()> {
        self.conn.close().await?;
        info!("Database closed");
        Ok(())
    }

    fn prompt_repo(&self) -> repositories::prompt::PromptRepository {
        repositories::prompt::PromptRepository::new(self.conn.clone(), self.clock.clone())
    }

    fn model_repo(&self) -> repositories::model::ModelRepository {
        repositories::model::ModelRepository::new(self.conn.clone(), self.clock.clone())
    }

    fn result_repo(&self) -> repositories::result::ResultRepository {
        repositories::result::ResultRepository::new(self.conn.clone(), self.clock.clone())
    }

    fn setting_repo(&self) -> repositories::setting::SettingRepository {
        repositories::setting::SettingRepository::new(self.conn.clone(), self.clock.clone())
    }

    // ------------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------------

    pub async fn create_prompt(&self, text: &str, tags: &[String]) -> StoreResult<Prompt> {
        self.prompt_repo().create(text, tags).await
    }

    pub async fn get_prompt(&self, id: i32) -> StoreResult<Option<Prompt>> {
        self.prompt_repo().get(id).await
    }

    pub async fn list_prompts(&self, sort: PromptSort) -> StoreResult<Vec<Prompt>> {
        self.prompt_repo().list(sort).await
    }

    pub async fn search_prompts(
        &self,
        query: &str,
        include_tags: bool,
    ) -> StoreResult<Vec<Prompt>> {
        self.prompt_repo().search(query, include_tags).await
    }

    pub async fn search_prompts_by_tags(&self, tags: &[String]) -> StoreResult<Vec<Prompt>> {
        self.prompt_repo().search_by_tags(tags).await
    }

    pub async fn update_prompt_tags(&self, id: i32, tags: &[String]) -> StoreResult<Prompt> {
        self.prompt_repo().update_tags(id, tags).await
    }

    /// Returns the number of results removed along with the prompt.
    pub async fn delete_prompt(&self, id: i32) -> StoreResult<u64> {
        self.prompt_repo().delete(id).await
    }

    // ------------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------------

    pub async fn create_model(&self, new: &NewModel) -> StoreResult<LanguageModel> {
        self.model_repo().create(new).await
    }

    pub async fn get_model(&self, id: i32) -> StoreResult<Option<LanguageModel>> {
        self.model_repo().get(id).await
    }

    pub async fn get_model_by_name(&self, name: &str) -> StoreResult<Option<LanguageModel>> {
        self.model_repo().get_by_name(name).await
    }

    pub async fn list_models(&self, include_inactive: bool) -> StoreResult<Vec<LanguageModel>> {
        self.model_repo().list(include_inactive).await
    }

    /// Active models ordered by name, the fan-out order of a dispatch.
    pub async fn list_active_models(&self) -> StoreResult<Vec<LanguageModel>> {
        self.model_repo().list(false).await
    }

    pub async fn search_models(&self, query: &str) -> StoreResult<Vec<LanguageModel>> {
        self.model_repo().search(query).await
    }

    pub async fn update_model(&self, id: i32, update: &ModelUpdate) -> StoreResult<LanguageModel> {
        self.model_repo().update(id, update).await
    }

    pub async fn set_model_active(&self, id: i32, is_active: bool) -> StoreResult<LanguageModel> {
        let update = ModelUpdate {
            is_active: Some(is_active),
            ..Default::default()
        };
        self.model_repo().update(id, &update).await
    }

    /// Returns the number of results removed along with the model.
    pub async fn delete_model(&self, id: i32) -> StoreResult<u64> {
        self.model_repo().delete(id).await
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    pub async fn persist_result(
        &self,
        prompt_id: i32,
        model_id: i32,
        response: &str,
        note: Option<&str>,
        mode: PersistMode,
    ) -> StoreResult<SavedResult> {
        self.result_repo()
            .persist(prompt_id, model_id, response, note, mode)
            .await
    }

    pub async fn get_result(&self, id: i32) -> StoreResult<Option<SavedResult>> {
        self.result_repo().get(id).await
    }

    pub async fn get_result_for(
        &self,
        prompt_id: i32,
        model_id: i32,
    ) -> StoreResult<Option<SavedResult>> {
        self.result_repo().get_for(prompt_id, model_id).await
    }

    pub async fn list_results(
        &self,
        filter: ResultFilter,
        sort: ResultSort,
    ) -> StoreResult<Vec<SavedResult>> {
        self.result_repo().list(filter, sort).await
    }

    pub async fn search_results(&self, query: &str) -> StoreResult<Vec<SavedResult>> {
        self.result_repo().search(query).await
    }

    pub async fn delete_result(&self, id: i32) -> StoreResult<()> {
        self.result_repo().delete(id).await
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub async fn get_setting(&self, key: &str) -> StoreResult<Option<Setting>> {
        self.setting_repo().get(key).await
    }

    pub async fn set_setting(&self, key: &str, value: Option<&str>) -> StoreResult<Setting> {
        self.setting_repo().set(key, value).await
    }

    pub async fn list_settings(&self) -> StoreResult<Vec<Setting>> {
        self.setting_repo().list().await
    }

    pub async fn delete_setting(&self, key: &str) -> StoreResult<()> {
        self.setting_repo().delete(key).await
    }

    /// Numeric setting; unparsable values are ignored with a warning.
    pub async fn setting_u64(&self, key: &str) -> StoreResult<Option<u64>> {
        let Some(value) = self.get_setting(key).await?.and_then(|s| s.value) else {
            return Ok(None);
        };

        match value.trim().parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                warn!(key, value = %value, "Ignoring non-numeric setting");
                Ok(None)
            }
        }
    }

    pub async fn setting_bool(&self, key: &str) -> StoreResult<Option<bool>> {
        let Some(value) = self.get_setting(key).await?.and_then(|s| s.value) else {
            return Ok(None);
        };

        let flag = parse_flag(&value);
        if flag.is_none() {
            warn!(key, value = %value, "Ignoring non-boolean setting");
        }
        Ok(flag)
    }
}
