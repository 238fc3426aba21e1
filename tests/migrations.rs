use mergington::database::{self, activities_repo, migrations};
use mergington::AppConfig;

fn file_config(dir: &tempfile::TempDir) -> AppConfig {
    AppConfig {
        database_url: format!("sqlite://{}", dir.path().join("school.db").display()),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn reopening_a_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    let pool = database::init(&config).await.unwrap();
    assert_eq!(
        migrations::current_version(&pool).await.unwrap(),
        migrations::latest_version()
    );
    assert_eq!(activities_repo::count_activities(&pool).await.unwrap(), 9);
    pool.close().await;

    let pool = database::init(&config).await.unwrap();
    assert_eq!(
        migrations::current_version(&pool).await.unwrap(),
        migrations::latest_version()
    );
    assert_eq!(activities_repo::count_activities(&pool).await.unwrap(), 9);
}

#[tokio::test]
async fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);
    let pool = database::connect(&config.database_url, 1).await.unwrap();

    let future = migrations::latest_version() + 1;
    sqlx::raw_sql(&format!("PRAGMA user_version = {}", future))
        .execute(&pool)
        .await
        .unwrap();

    match migrations::apply_migrations(&pool).await {
        Err(migrations::MigrationError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => {
            assert_eq!(db_version, future);
            assert_eq!(latest_supported, migrations::latest_version());
        }
        other => panic!("expected UnsupportedSchemaVersion, got {:?}", other),
    }
}
