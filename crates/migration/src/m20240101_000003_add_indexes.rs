use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_student::Student;
use crate::m20240101_000002_create_token::Token;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Student: listing is ordered by last name
        manager
            .create_index(
                Index::create()
                    .name("idx_student_last_name")
                    .table(Student::Table)
                    .col(Student::LastName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Token: commit deletes every token owned by a student
        manager
            .create_index(
                Index::create()
                    .name("idx_token_student")
                    .table(Token::Table)
                    .col(Token::StudentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Token: expiry sweeps
        manager
            .create_index(
                Index::create()
                    .name("idx_token_expiry")
                    .table(Token::Table)
                    .col(Token::Expiry)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_index(Index::drop().name("idx_token_expiry").table(Token::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_token_student").table(Token::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_student_last_name").table(Student::Table).to_owned()).await?;
        Ok(())
    }
}
