#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use configs::{AppConfig, DatabaseConfig};
use models::db::connect_with_config;

// Migrations run once per test process; `false` means the database is unusable.
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn test_db_config() -> DatabaseConfig {
    let mut cfg = AppConfig::load_or_env().map(|c| c.database).unwrap_or_default();
    cfg.max_connections = cfg.max_connections.max(10);
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = cfg.acquire_timeout_secs.min(10);
    cfg
}

/// A fresh connection for the current test's runtime, or `None` when
/// `SKIP_DB_TESTS` is set or Postgres is unreachable.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(None);
    }
    let ready = *MIGRATED
        .get_or_init(|| async {
            let db = match connect_with_config(&test_db_config()).await {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {e}");
                    return false;
                }
            };
            match migration::Migrator::up(&db, None).await {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("skip: migrate up failed: {e}");
                    false
                }
            }
        })
        .await;
    if !ready {
        return Ok(None);
    }
    Ok(Some(connect_with_config(&test_db_config()).await?))
}
