use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum TrainingList {
    Table,
    Id,
    Login,
    Hired,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TrainingList::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrainingList::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrainingList::Login).string_len(150).not_null())
                    .col(
                        ColumnDef::new(TrainingList::Hired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TrainingList::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Hiring updates match on login.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_training_list_login")
                    .table(TrainingList::Table)
                    .col(TrainingList::Login)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(TrainingList::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}
