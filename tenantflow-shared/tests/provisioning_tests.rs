/// Integration tests for tenant provisioning
///
/// Run with: cargo test --test provisioning_tests

mod common;

use futures::future::join_all;
use tenantflow_shared::db::migrations::{applied_schema_version, latest_tenant_schema_version};
use tenantflow_shared::models::member::{Member, MemberRole};
use tenantflow_shared::models::tenant::{CreateTenant, Tenant};
use tenantflow_shared::models::user::{CreateUser, User};
use tenantflow_shared::tenancy::demo::{demo_member_email, DEMO_PASSWORD};
use tenantflow_shared::tenancy::provisioner::AdminSeed;

use common::{register, remove_tenant, setup, unique_code, TestEnv};

/// Inserts committed landlord rows without provisioning
async fn tenant_row(env: &TestEnv, code: &str) -> Tenant {
    let user = User::create(
        &env.central,
        CreateUser {
            name: "Owner".to_string(),
            email: format!("owner@{}.com", code),
            password_hash: "$argon2id$placeholder".to_string(),
        },
    )
    .await
    .expect("Failed to create user");

    Tenant::create(
        &env.central,
        CreateTenant::for_short_code(format!("{} Inc", code), code, user.id),
    )
    .await
    .expect("Failed to create tenant")
}

fn seed(code: &str) -> AdminSeed {
    AdminSeed {
        name: "Admin".to_string(),
        email: format!("admin@{}.com", code),
        password_hash: "$argon2id$placeholder".to_string(),
    }
}

#[tokio::test]
async fn test_provision_creates_schema_and_admin() {
    let env = setup().await;
    let code = unique_code("prov");
    let tenant = tenant_row(&env, &code).await;

    let admin = env
        .resolver
        .provisioner()
        .provision(&tenant, &seed(&code))
        .await
        .expect("Provisioning should succeed");

    assert_eq!(admin.role, MemberRole::Admin);
    assert_eq!(admin.tenant_id, tenant.id);

    let db = env.connections.connect(&tenant.database_name).await.unwrap();
    assert_eq!(
        applied_schema_version(db.pool()).await.unwrap(),
        latest_tenant_schema_version()
    );

    remove_tenant(&env, &tenant).await;
}

#[tokio::test]
async fn test_provision_twice_is_noop() {
    let env = setup().await;
    let code = unique_code("prov");
    let tenant = tenant_row(&env, &code).await;
    let provisioner = env.resolver.provisioner();

    let first = provisioner.provision(&tenant, &seed(&code)).await.unwrap();
    let second = provisioner.provision(&tenant, &seed(&code)).await.unwrap();
    assert_eq!(first.id, second.id);

    let db = env.connections.connect(&tenant.database_name).await.unwrap();
    let members = Member::list(db.pool(), tenant.id).await.unwrap();
    assert_eq!(members.len(), 1);

    remove_tenant(&env, &tenant).await;
}

#[tokio::test]
async fn test_concurrent_provisioning_converges() {
    let env = setup().await;
    let code = unique_code("prov");
    let tenant = tenant_row(&env, &code).await;
    let admin_seed = seed(&code);
    let provisioner = env.resolver.provisioner();

    let results = join_all((0..4).map(|_| provisioner.provision(&tenant, &admin_seed))).await;

    let ids: Vec<i64> = results
        .into_iter()
        .map(|r| r.expect("every concurrent attempt should succeed").id)
        .collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]), "admin ids differ: {:?}", ids);

    let db = env.connections.connect(&tenant.database_name).await.unwrap();
    assert_eq!(Member::list(db.pool(), tenant.id).await.unwrap().len(), 1);

    remove_tenant(&env, &tenant).await;
}

#[tokio::test]
async fn test_reconcile_all_migrates_registered_tenants() {
    let env = setup().await;
    let code = unique_code("prov");
    let tenant = tenant_row(&env, &code).await;

    let report = env
        .resolver
        .provisioner()
        .reconcile_all()
        .await
        .expect("reconcile should run");

    assert!(report.migrated >= 1);
    assert!(!report.failed.contains(&tenant.database_name));

    let db = env.connections.connect(&tenant.database_name).await.unwrap();
    assert_eq!(
        applied_schema_version(db.pool()).await.unwrap(),
        latest_tenant_schema_version()
    );

    remove_tenant(&env, &tenant).await;
}

#[tokio::test]
async fn test_demo_seeding_is_repeatable() {
    let env = setup().await;
    let outcome = register(&env, &unique_code("demo")).await;
    let provisioner = env.resolver.provisioner();
    let password_hash = env.resolver.hasher().hash(DEMO_PASSWORD).unwrap();

    let first = provisioner
        .seed_demo(&outcome.tenant, &password_hash)
        .await
        .expect("Demo seeding should succeed");
    let second = provisioner
        .seed_demo(&outcome.tenant, &password_hash)
        .await
        .expect("Repeated demo seeding should succeed");

    assert_eq!(first, second);
    assert_eq!(first.members, 3);
    assert_eq!(first.projects, 2);
    assert_eq!(first.tasks, 10);

    let login = env
        .resolver
        .login(&demo_member_email(&outcome.tenant, 1), DEMO_PASSWORD)
        .await
        .expect("demo member should log in");
    assert_eq!(login.role, MemberRole::Member);

    remove_tenant(&env, &outcome.tenant).await;
}
