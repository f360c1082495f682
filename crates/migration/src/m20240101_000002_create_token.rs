//! Create `token` table storing bearer sessions.
//!
//! `token` (plaintext) is nullable: it is only written when the service runs
//! with plaintext lookup. `token_hash` is the raw SHA-256 digest.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Token::Table)
                    .if_not_exists()
                    .col(uuid(Token::Id).primary_key())
                    .col(uuid(Token::StudentId).not_null())
                    .col(string_len(Token::Email, 255).not_null())
                    .col(ColumnDef::new(Token::Token).string_len(26).null().unique_key())
                    .col(ColumnDef::new(Token::TokenHash).binary().not_null().unique_key())
                    .col(timestamp_with_time_zone(Token::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Token::UpdatedAt).not_null())
                    .col(timestamp_with_time_zone(Token::Expiry).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_token_student")
                            .from(Token::Table, Token::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Token::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Token {
    Table,
    Id,
    StudentId,
    Email,
    Token,
    TokenHash,
    CreatedAt,
    UpdatedAt,
    Expiry,
}

#[derive(DeriveIden)]
enum Student { Table, Id }
