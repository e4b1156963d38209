use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Prompts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Models)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Carries the ON DELETE CASCADE foreign keys to both parents.
        manager
            .create_table(
                schema
                    .create_table_from_entity(Results)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Settings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_results_prompt_model ON results(prompt_id, model_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_models_is_active ON models(is_active)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Results).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Models).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Prompts).to_owned())
            .await?;

        Ok(())
    }
}
