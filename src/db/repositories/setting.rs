use crate::db::clock::MonotonicClock;
use crate::entities::{prelude::*, settings};
use crate::error::{StoreError, StoreResult};
use crate::models::setting::Setting;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set, sea_query::OnConflict};

pub struct SettingRepository {
    conn: DatabaseConnection,
    clock: MonotonicClock,
}

impl SettingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, clock: MonotonicClock) -> Self {
        Self { conn, clock }
    }

    fn map_model(m: settings::Model) -> Setting {
        Setting {
            key: m.key,
            value: m.value,
            updated_at: m.updated_at,
        }
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<Setting>> {
        let row = Settings::find_by_id(key.to_string())
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn set(&self, key: &str, value: Option<&str>) -> StoreResult<Setting> {
        let key = key.trim();
        if key.is_empty() {
            return Err(StoreError::invalid("Setting key must not be empty"));
        }

        let setting = Setting {
            key: key.to_string(),
            value: value.map(str::to_string),
            updated_at: self.clock.stamp(),
        };

        let active_model = settings::ActiveModel {
            key: Set(setting.key.clone()),
            value: Set(setting.value.clone()),
            updated_at: Set(setting.updated_at.clone()),
        };

        Settings::insert(active_model)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .update_columns([settings::Column::Value, settings::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(setting)
    }

    pub async fn list(&self) -> StoreResult<Vec<Setting>> {
        let rows = Settings::find()
            .order_by_asc(settings::Column::Key)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let removed = Settings::delete_by_id(key.to_string())
            .exec(&self.conn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(StoreError::not_found("Setting", key));
        }
        Ok(())
    }
}
