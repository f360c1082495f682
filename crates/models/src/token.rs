//! Bearer session rows.
//!
//! `token_hash` is the raw SHA-256 digest of the plaintext token and is never
//! serialized. `token` carries the plaintext only when the service stores it
//! for plaintext lookup; otherwise it is NULL.

use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::student;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub email: String,
    pub token: Option<String>,
    #[serde(skip)]
    pub token_hash: Vec<u8>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub expiry: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Student }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Student => Entity::belongs_to(student::Entity)
                .from(Column::StudentId)
                .to(student::Column::Id)
                .into(),
        }
    }
}

impl Related<student::Entity> for Entity {
    fn to() -> RelationDef { Relation::Student.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// A token row ready for insertion.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub student_id: Uuid,
    pub email: String,
    pub token: Option<String>,
    pub token_hash: Vec<u8>,
    pub expiry: DateTimeWithTimeZone,
}

pub async fn insert(db: &DatabaseConnection, input: NewToken) -> Result<Model, errors::ModelError> {
    if input.token_hash.len() != 32 {
        return Err(errors::ModelError::Validation("token hash must be 32 bytes".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(input.student_id),
        email: Set(input.email),
        token: Set(input.token),
        token_hash: Set(input.token_hash),
        created_at: Set(now),
        updated_at: Set(now),
        expiry: Set(input.expiry),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::from_insert("token", e))
}

/// Returns the number of rows removed.
pub async fn delete_for_student(db: &DatabaseConnection, student_id: Uuid) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::StudentId.eq(student_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn find_by_plaintext(db: &DatabaseConnection, plaintext: &str) -> Result<Option<Model>, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::Token.eq(plaintext.to_string()))
        .one(db)
        .await?;
    Ok(found)
}

pub async fn find_by_hash(db: &DatabaseConnection, hash: &[u8]) -> Result<Option<Model>, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::TokenHash.eq(hash.to_vec()))
        .one(db)
        .await?;
    Ok(found)
}

pub async fn delete_by_plaintext(db: &DatabaseConnection, plaintext: &str) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Token.eq(plaintext.to_string()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn delete_by_hash(db: &DatabaseConnection, hash: &[u8]) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_many()
        .filter(Column::TokenHash.eq(hash.to_vec()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
