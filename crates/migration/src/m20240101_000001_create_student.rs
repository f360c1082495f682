//! Create `student` table.
//!
//! Holds the login identity (unique email + argon2 PHC hash) and the
//! per-student course lists as Postgres text arrays.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(uuid(Student::Id).primary_key())
                    .col(string_len(Student::Email, 255).unique_key().not_null())
                    .col(string_len(Student::FirstName, 128).not_null())
                    .col(string_len(Student::LastName, 128).not_null())
                    .col(ColumnDef::new(Student::EnrollmentNo).string_len(32).null())
                    .col(ColumnDef::new(Student::FacultyNo).string_len(32).null())
                    .col(ColumnDef::new(Student::Course).string_len(128).null())
                    .col(ColumnDef::new(Student::Semester).integer().null())
                    .col(string_len(Student::PasswordHash, 255).not_null())
                    .col(text_array(Student::RegisteredCourses))
                    .col(text_array(Student::Feedbacks))
                    .col(text_array(Student::FilledFeedbacks))
                    .col(timestamp_with_time_zone(Student::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Student::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Student::Table).to_owned()).await
    }
}

/// `text[] not null default '{}'`
fn text_array(col: Student) -> ColumnDef {
    ColumnDef::new(col)
        .array(ColumnType::Text)
        .not_null()
        .default(Expr::cust("'{}'"))
        .to_owned()
}

#[derive(DeriveIden)]
pub(crate) enum Student {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    EnrollmentNo,
    FacultyNo,
    Course,
    Semester,
    PasswordHash,
    RegisteredCourses,
    Feedbacks,
    FilledFeedbacks,
    CreatedAt,
    UpdatedAt,
}
