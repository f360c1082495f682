//! Database-backed model tests. They run against `DATABASE_URL` and are
//! skipped when `SKIP_DB_TESTS` is set or no database is reachable.

use crate::db::connect;
use crate::errors::ModelError;
use crate::{student, token};
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use sea_orm::{DatabaseConnection, EntityTrait};
use anyhow::Result;
use uuid::Uuid;

async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

fn random_hash() -> Vec<u8> {
    [*Uuid::new_v4().as_bytes(), *Uuid::new_v4().as_bytes()].concat()
}

fn new_student(email: &str) -> student::NewStudent {
    student::NewStudent {
        email: email.to_string(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        enrollment_no: Some("GK1234".into()),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA".into(),
        ..Default::default()
    }
}

#[test]
fn email_and_name_validation() {
    assert!(student::validate_email("a@x.com").is_ok());
    assert!(student::validate_email("ax.com").is_err());
    assert!(student::validate_email("   ").is_err());
    assert!(student::validate_name("Ada").is_ok());
    assert!(student::validate_name(" ").is_err());
    assert!(student::validate_name(&"n".repeat(129)).is_err());
}

#[tokio::test]
async fn test_student_crud() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = format!("crud_{}@example.com", Uuid::new_v4());
    let created = student::create(&db, new_student(&email)).await?;
    assert_eq!(created.email, email);
    assert!(created.registered_courses.is_empty());

    let by_email = student::find_by_email(&db, &email).await?.expect("student by email");
    assert_eq!(by_email.id, created.id);

    let updated = student::update_password(&db, created.id, "$argon2id$v=19$new".into()).await?;
    assert_eq!(updated.password_hash, "$argon2id$v=19$new");
    assert!(updated.updated_at >= created.updated_at);

    let dup = student::create(&db, new_student(&email)).await;
    assert!(matches!(dup, Err(ModelError::Conflict("student"))));

    student::hard_delete(&db, created.id).await?;
    assert!(student::find_by_id(&db, created.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_token_lookup_and_delete() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = format!("tok_{}@example.com", Uuid::new_v4());
    let s = student::create(&db, new_student(&email)).await?;

    let plaintext = format!("{:0<26}", &Uuid::new_v4().simple().to_string().to_uppercase()[..20]);
    let hash = random_hash();
    let row = token::insert(&db, token::NewToken {
        student_id: s.id,
        email: s.email.clone(),
        token: Some(plaintext.clone()),
        token_hash: hash.clone(),
        expiry: (Utc::now() + Duration::hours(1)).into(),
    }).await?;

    assert_eq!(token::find_by_plaintext(&db, &plaintext).await?.map(|t| t.id), Some(row.id));
    assert_eq!(token::find_by_hash(&db, &hash).await?.map(|t| t.id), Some(row.id));

    assert_eq!(token::delete_by_plaintext(&db, &plaintext).await?, 1);
    assert_eq!(token::delete_by_plaintext(&db, &plaintext).await?, 0);

    // short hashes are refused before reaching the database
    let bad = token::insert(&db, token::NewToken {
        student_id: s.id,
        email: s.email.clone(),
        token: None,
        token_hash: vec![1, 2, 3],
        expiry: Utc::now().into(),
    }).await;
    assert!(bad.is_err());

    student::hard_delete(&db, s.id).await?;
    assert!(token::Entity::find_by_id(row.id).one(&db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_delete_for_student_removes_all_rows() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let s = student::create(&db, new_student(&format!("many_{}@example.com", Uuid::new_v4()))).await?;
    for _ in 0..2 {
        token::insert(&db, token::NewToken {
            student_id: s.id,
            email: s.email.clone(),
            token: None,
            token_hash: random_hash(),
            expiry: (Utc::now() + Duration::hours(1)).into(),
        }).await?;
    }
    assert_eq!(token::delete_for_student(&db, s.id).await?, 2);
    student::hard_delete(&db, s.id).await?;
    Ok(())
}
