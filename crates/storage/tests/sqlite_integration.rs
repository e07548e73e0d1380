use quiz_core::SessionToken;
use storage::repository::{Storage, TokenStore};
use storage::sqlite::SqliteRepository;

fn temp_db_url(name: &str) -> (std::path::PathBuf, String) {
    let path = std::env::temp_dir().join(format!(
        "quiz-storage-{name}-{}.sqlite3",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());
    (path, url)
}

#[tokio::test]
async fn sqlite_token_roundtrip_and_clear() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_tokens?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.get().await.unwrap().is_none());

    repo.set(&SessionToken::new("first.token.sig")).await.unwrap();
    repo.set(&SessionToken::new("second.token.sig")).await.unwrap();
    assert_eq!(
        repo.get().await.unwrap(),
        Some(SessionToken::new("second.token.sig"))
    );

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_tokens")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);

    repo.clear().await.unwrap();
    repo.clear().await.unwrap();
    assert!(repo.get().await.unwrap().is_none());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate_twice?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(versions, 1);
}

#[tokio::test]
async fn token_survives_reconnect() {
    let (path, url) = temp_db_url("reconnect");

    let storage = Storage::sqlite(&url).await.expect("open");
    storage
        .tokens
        .set(&SessionToken::new("kept.across.restart"))
        .await
        .unwrap();
    drop(storage);

    let reopened = SqliteRepository::connect(&url).await.expect("reopen");
    reopened.migrate().await.expect("migrate");
    assert_eq!(
        reopened.get().await.unwrap(),
        Some(SessionToken::new("kept.across.restart"))
    );

    reopened.clear().await.unwrap();
    reopened.pool().close().await;
    drop(reopened);

    let after_logout = Storage::sqlite(&url).await.expect("open again");
    assert!(after_logout.tokens.get().await.unwrap().is_none());

    let _ = std::fs::remove_file(&path);
}
