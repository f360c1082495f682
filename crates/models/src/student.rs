use sea_orm::{entity::prelude::*, DatabaseConnection, PaginatorTrait, QueryOrder, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;
use crate::token;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_no: Option<String>,
    pub faculty_no: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub registered_courses: Vec<String>,
    pub feedbacks: Vec<String>,
    pub filled_feedbacks: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Token,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Token => Entity::has_many(token::Entity).into() }
    }
}

impl Related<token::Entity> for Entity {
    fn to() -> RelationDef { Relation::Token.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields accepted when a student row is created. `password_hash` must
/// already be a PHC string; hashing happens in the service layer.
#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_no: Option<String>,
    pub faculty_no: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
    pub password_hash: String,
}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.len() > 255 {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if name.len() > 128 { return Err(errors::ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

pub async fn create(db: &DatabaseConnection, input: NewStudent) -> Result<Model, errors::ModelError> {
    validate_email(&input.email)?;
    validate_name(&input.first_name)?;
    validate_name(&input.last_name)?;
    if input.password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(input.email.trim().to_string()),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        enrollment_no: Set(input.enrollment_no),
        faculty_no: Set(input.faculty_no),
        course: Set(input.course),
        semester: Set(input.semester),
        password_hash: Set(input.password_hash),
        registered_courses: Set(Vec::new()),
        feedbacks: Set(Vec::new()),
        filled_feedbacks: Set(Vec::new()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::from_insert("student", e))
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    let found = Entity::find()
        .filter(Column::Email.eq(email.trim().to_string()))
        .one(db)
        .await?;
    Ok(found)
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Replace the stored password hash and bump `updated_at`.
pub async fn update_password(db: &DatabaseConnection, id: Uuid, password_hash: String) -> Result<Model, errors::ModelError> {
    if password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(errors::ModelError::NotFound("student"))?
        .into();
    am.password_hash = Set(password_hash);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

/// Page through students ordered by last name; `page_idx` is 0-based.
pub async fn list_by_last_name(db: &DatabaseConnection, page_idx: u64, per_page: u64) -> Result<Vec<Model>, errors::ModelError> {
    let rows = Entity::find()
        .order_by_asc(Column::LastName)
        .order_by_asc(Column::FirstName)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await?;
    Ok(rows)
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}
