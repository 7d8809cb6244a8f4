use std::time::Duration;

use taskboard::db::{self, accounts};
use taskboard::services::SessionSweeper;

#[tokio::test]
async fn test_sweep_removes_only_expired_sessions() {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");

    let user = accounts::insert_user(&pool, "Sweep", "sweep@example.com", "hash")
        .await
        .expect("Failed to insert user");
    accounts::insert_session(&pool, "stale", &user.id, "2000-01-01T00:00:00.000000Z")
        .await
        .expect("Failed to insert session");
    accounts::insert_session(&pool, "live", &user.id, "2999-01-01T00:00:00.000000Z")
        .await
        .expect("Failed to insert session");

    let sweeper = SessionSweeper::new(pool.clone(), Duration::from_secs(3600));
    assert_eq!(sweeper.sweep_once().await.expect("Sweep failed"), 1);

    let now = db::now();
    assert_eq!(accounts::find_session_user(&pool, "stale", &now).await.unwrap(), None);
    assert_eq!(
        accounts::find_session_user(&pool, "live", &now).await.unwrap(),
        Some(user.id.clone())
    );
}

#[tokio::test]
async fn test_sweeper_runs_in_background() {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");

    let user = accounts::insert_user(&pool, "Bg", "bg@example.com", "hash")
        .await
        .expect("Failed to insert user");
    accounts::insert_session(&pool, "stale", &user.id, "2000-01-01T00:00:00.000000Z")
        .await
        .expect("Failed to insert session");

    let sweeper = SessionSweeper::new(pool.clone(), Duration::from_millis(50));
    let handle = tokio::spawn(async move {
        sweeper.start().await;
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.abort();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
        .fetch_one(&pool)
        .await
        .expect("Failed to count sessions");
    assert_eq!(remaining, 0);
}
