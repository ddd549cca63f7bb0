use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

use yatube_infra::database::entity::{comment, group, post, user};

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20210704_000001_create_tables"
    }
}

fn create_stmt<E: EntityTrait>(schema: &Schema, e: E) -> TableCreateStatement {
    schema.create_table_from_entity(e).if_not_exists().to_owned()
}

fn drop_stmt<E: EntityTrait>(e: E) -> TableDropStatement {
    Table::drop().table(e).if_exists().to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Referenced tables first so the foreign keys resolve.
        let stmts = vec![
            create_stmt(&schema, user::Entity),
            create_stmt(&schema, group::Entity),
            create_stmt(&schema, post::Entity),
            create_stmt(&schema, comment::Entity),
        ];
        for stmt in stmts {
            manager.create_table(stmt).await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_pub_date")
                    .table(post::Entity)
                    .col(post::Column::PubDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_id")
                    .table(comment::Entity)
                    .col(comment::Column::PostId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let stmts = vec![
            drop_stmt(comment::Entity),
            drop_stmt(post::Entity),
            drop_stmt(group::Entity),
            drop_stmt(user::Entity),
        ];
        for stmt in stmts {
            manager.drop_table(stmt).await?;
        }

        Ok(())
    }
}
