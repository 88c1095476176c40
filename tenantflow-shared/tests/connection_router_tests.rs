/// Integration tests for tenant database routing
///
/// Run with: cargo test --test connection_router_tests

mod common;

use futures::future::join_all;
use tenantflow_shared::auth::resolver::AuthError;
use tenantflow_shared::db::migrations::{drop_database, ensure_database_exists};
use tenantflow_shared::db::router::{ConnectionError, TenantPoolConfig};

use common::{setup, setup_with, unique_code, TestEnv};

async fn scratch_database(env: &TestEnv) -> String {
    let name = unique_code("rt_");
    let created = ensure_database_exists(&env.central, &name)
        .await
        .expect("Failed to create scratch database");
    assert!(created);
    name
}

async fn drop_scratch(env: &TestEnv, name: &str) {
    env.connections.evict(name).await;
    drop_database(&env.central, name)
        .await
        .expect("Failed to drop scratch database");
}

#[tokio::test]
async fn test_connect_routes_to_named_database() {
    let env = setup().await;
    let name = scratch_database(&env).await;

    let db = env.connections.connect(&name).await.expect("connect should succeed");
    assert_eq!(db.database(), name);

    let current: String = sqlx::query_scalar("SELECT current_database()")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(current, name);

    drop_scratch(&env, &name).await;
}

#[tokio::test]
async fn test_pool_is_reused() {
    let env = setup().await;
    let name = scratch_database(&env).await;

    env.connections.connect(&name).await.unwrap();
    env.connections.connect(&name).await.unwrap();

    assert_eq!(env.connections.cached_databases().await, vec![name.clone()]);
    assert_eq!(env.connections.pool_count().await, 1);

    drop_scratch(&env, &name).await;
}

#[tokio::test]
async fn test_concurrent_connects_share_one_pool() {
    let env = setup().await;
    let name = scratch_database(&env).await;

    let results = join_all((0..8).map(|_| env.connections.connect(&name))).await;
    for result in &results {
        assert!(result.is_ok(), "connect failed: {:?}", result.as_ref().err());
    }
    assert_eq!(env.connections.pool_count().await, 1);

    drop_scratch(&env, &name).await;
}

#[tokio::test]
async fn test_concurrent_requests_do_not_share_routing() {
    let env = setup().await;
    let first = scratch_database(&env).await;
    let second = scratch_database(&env).await;

    let queries = (0..10).map(|i| {
        let target = if i % 2 == 0 { first.clone() } else { second.clone() };
        let connections = env.connections.clone();
        async move {
            let db = connections.connect(&target).await.unwrap();
            let current: String = sqlx::query_scalar("SELECT current_database()")
                .fetch_one(db.pool())
                .await
                .unwrap();
            (target, current)
        }
    });

    for (target, current) in join_all(queries).await {
        assert_eq!(target, current);
    }

    drop_scratch(&env, &first).await;
    drop_scratch(&env, &second).await;
}

#[tokio::test]
async fn test_unknown_database() {
    let env = setup().await;
    let name = unique_code("missing_");

    let err = env.connections.connect(&name).await.unwrap_err();
    assert!(
        matches!(err, ConnectionError::UnknownDatabase { ref database } if *database == name),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(env.connections.pool_count().await, 0);
}

#[tokio::test]
async fn test_statement_timeout_is_applied() {
    let env = setup_with(TenantPoolConfig {
        statement_timeout_ms: 100,
        ..Default::default()
    })
    .await;
    let name = scratch_database(&env).await;

    let db = env.connections.connect(&name).await.unwrap();
    let err = sqlx::query("SELECT pg_sleep(2)")
        .execute(db.pool())
        .await
        .unwrap_err();
    assert!(matches!(AuthError::from(err), AuthError::QueryTimeout));

    drop_scratch(&env, &name).await;
}

#[tokio::test]
async fn test_evict_then_reconnect() {
    let env = setup().await;
    let name = scratch_database(&env).await;

    let first = env.connections.connect(&name).await.unwrap();
    assert!(env.connections.evict(&name).await);
    assert!(first.pool().is_closed());
    assert!(!env.connections.evict(&name).await);

    let second = env.connections.connect(&name).await.unwrap();
    assert!(!second.pool().is_closed());
    assert_eq!(env.connections.stats().await.len(), 1);

    drop_scratch(&env, &name).await;
}

#[tokio::test]
async fn test_ensure_database_exists_is_idempotent() {
    let env = setup().await;
    let name = scratch_database(&env).await;

    let again = ensure_database_exists(&env.central, &name).await.unwrap();
    assert!(!again, "second create should report existing database");

    drop_scratch(&env, &name).await;
}
