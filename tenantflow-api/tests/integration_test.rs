/// Integration tests for the TenantFlow API
///
/// These tests drive the full router against a real PostgreSQL server:
/// - Registration, login and logout
/// - Tenant authentication middleware and diagnostic headers
/// - Member, project and task management with role checks
/// - Isolation between tenants

mod common;

use axum::http::{Method, StatusCode};
use common::{unique_code, Company, TestContext, PASSWORD};
use serde_json::json;
use tenantflow_shared::models::user::User;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.json(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert!(body["tenant_pools"].is_u64());
}

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await;
    let company = ctx.register("acme").await;

    let tenant_id = company.token.split('|').next().unwrap().to_string();

    let (status, body) = ctx
        .json(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": company.admin_email, "password": PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["role"], "admin");
    assert_eq!(body["database"], format!("db_{}", company.code));
    assert!(body["access_token"]
        .as_str()
        .unwrap()
        .starts_with(&format!("{}|", tenant_id)));

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_mixed_case_registration_email_can_log_in() {
    let ctx = TestContext::new().await;
    let code = unique_code("case");
    let typed_email = format!("Boss@{}.COM", code.to_uppercase());

    let (status, body) = ctx
        .json(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "name": "Boss",
                "email": typed_email,
                "password": PASSWORD,
                "company_name": format!("Company {}", code),
                "company_short_code": code,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let company = Company {
        token: body["access_token"].as_str().unwrap().to_string(),
        admin_email: format!("boss@{}.com", code),
        code,
    };

    let user = User::find_by_email(ctx.state.resolver.central(), &company.admin_email)
        .await
        .unwrap()
        .expect("landlord user should be stored lowercase");
    assert_eq!(user.email, company.admin_email);

    ctx.login(&company.admin_email, PASSWORD).await;
    ctx.login(&typed_email, PASSWORD).await;

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "name": "Admin",
                "email": "admin@acme.com",
                "password": PASSWORD,
                "company_name": "Acme",
                "company_short_code": "acme-corp",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "company_short_code");

    let (status, body) = ctx
        .json(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "name": "Admin",
                "email": "not-an-email",
                "password": "short",
                "company_name": "Acme",
                "company_short_code": "acme",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_register_duplicate_short_code_conflicts() {
    let ctx = TestContext::new().await;
    let company = ctx.register("dup").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "name": "Copycat",
                "email": format!("copycat@{}.org", company.code),
                "password": PASSWORD,
                "company_name": "Copycat",
                "company_short_code": company.code,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Company short code already taken");

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_login_errors() {
    let ctx = TestContext::new().await;
    let company = ctx.register("errs").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": company.admin_email, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials.");

    let (status, _) = ctx
        .json(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": format!("ghost@{}.com", company.code), "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .json(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": "no-at-sign", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid email format");

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.json(Method::GET, "/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized - No token provided");

    let (status, body) = ctx
        .json(Method::GET, "/projects", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token format");
}

#[tokio::test]
async fn test_tenant_headers() {
    let ctx = TestContext::new().await;
    let company = ctx.register("hdrs").await;

    let response = ctx
        .send(Method::GET, "/members", Some(&company.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut parts = company.token.split('|');
    let tenant_id = parts.next().unwrap();
    let member_id = parts.next().unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-tenant-id"], tenant_id);
    assert_eq!(headers["x-member-id"], member_id);
    assert_eq!(headers["x-db-name"], format!("db_{}", company.code).as_str());

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new().await;
    let company = ctx.register("bye").await;
    let second = ctx.login(&company.admin_email, PASSWORD).await;

    let (status, body) = ctx
        .json(Method::POST, "/logout", Some(&company.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully.");

    let (status, body) = ctx
        .json(Method::GET, "/projects", Some(&company.token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    // Other sessions survive a single logout
    let (status, _) = ctx.json(Method::GET, "/projects", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .json(Method::POST, "/logout/all", Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], 1);

    let (status, _) = ctx.json(Method::GET, "/projects", Some(&second), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_member_management() {
    let ctx = TestContext::new().await;
    let company = ctx.register("crew").await;
    let admin = company.token.as_str();

    // Host is rewritten to the tenant domain
    let (status, bob) = ctx
        .json(
            Method::POST,
            "/members",
            Some(admin),
            Some(json!({ "name": "Bob", "email": "bob@gmail.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bob["email"], format!("bob@{}.com", company.code));
    assert_eq!(bob["role"], "member");
    assert!(bob.get("password_hash").is_none());
    let bob_id = bob["id"].as_i64().unwrap();

    let (status, body) = ctx
        .json(
            Method::POST,
            "/members",
            Some(admin),
            Some(json!({ "name": "Bob again", "email": "bob", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = ctx.json(Method::GET, "/members", Some(admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().unwrap().len(), 2);

    // Bob can log in and manage only his own profile
    let bob_token = ctx.login(&format!("bob@{}.com", company.code), PASSWORD).await;

    let (status, _) = ctx
        .json(Method::GET, &format!("/members/{}", bob_id), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let admin_id: i64 = company.token.split('|').nth(1).unwrap().parse().unwrap();
    let (status, body) = ctx
        .json(Method::GET, &format!("/members/{}", admin_id), Some(&bob_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized");

    let (status, body) = ctx
        .json(
            Method::PUT,
            &format!("/members/{}", bob_id),
            Some(&bob_token),
            Some(json!({ "name": "Robert" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Robert");

    let (status, _) = ctx
        .json(
            Method::PUT,
            &format!("/members/{}", bob_id),
            Some(&bob_token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .json(
            Method::POST,
            "/members",
            Some(&bob_token),
            Some(json!({ "name": "Eve", "email": "eve", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Deleting a member revokes their tokens
    let (status, body) = ctx
        .json(Method::DELETE, &format!("/members/{}", bob_id), Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked_tokens"], 1);

    let (status, _) = ctx.json(Method::GET, "/projects", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .json(Method::GET, &format!("/members/{}", bob_id), Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_projects_and_tasks() {
    let ctx = TestContext::new().await;
    let company = ctx.register("work").await;
    let admin = company.token.as_str();

    let (status, project) = ctx
        .json(Method::POST, "/projects", Some(admin), Some(json!({ "name": "Launch" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_i64().unwrap();

    let (status, task) = ctx
        .json(
            Method::POST,
            &format!("/projects/{}/tasks", project_id),
            Some(admin),
            Some(json!({ "name": "Write copy", "duration": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["duration"], 3);
    let task_id = task["id"].as_i64().unwrap();

    let (status, body) = ctx
        .json(Method::GET, &format!("/projects/{}", project_id), Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Launch");
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    let (status, body) = ctx
        .json(
            Method::PUT,
            &format!("/projects/{}/tasks/{}", project_id, task_id),
            Some(admin),
            Some(json!({ "duration": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration"], 5);
    assert_eq!(body["name"], "Write copy");

    let (status, body) = ctx
        .json(
            Method::PUT,
            &format!("/projects/{}", project_id),
            Some(admin),
            Some(json!({ "name": "Launch v2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Launch v2");

    let (status, _) = ctx
        .json(
            Method::POST,
            "/projects/999999/tasks",
            Some(admin),
            Some(json!({ "name": "Orphan" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .json(
            Method::POST,
            &format!("/projects/{}/tasks", project_id),
            Some(admin),
            Some(json!({ "name": "Negative", "duration": -1 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Deleting the project takes its tasks with it
    let (status, _) = ctx
        .json(Method::DELETE, &format!("/projects/{}", project_id), Some(admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .json(
            Method::GET,
            &format!("/projects/{}/tasks/{}", project_id, task_id),
            Some(admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_members_cannot_mutate_projects() {
    let ctx = TestContext::new().await;
    let company = ctx.register("ro").await;

    let (status, project) = ctx
        .json(
            Method::POST,
            "/projects",
            Some(&company.token),
            Some(json!({ "name": "Roadmap" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_i64().unwrap();

    let (status, _) = ctx
        .json(
            Method::POST,
            "/members",
            Some(&company.token),
            Some(json!({ "name": "Carol", "email": "carol", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let carol = ctx.login(&format!("carol@{}.com", company.code), PASSWORD).await;

    let (status, body) = ctx.json(Method::GET, "/projects", Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);

    for (method, uri, body) in [
        (Method::POST, "/projects".to_string(), Some(json!({ "name": "Mine" }))),
        (
            Method::PUT,
            format!("/projects/{}", project_id),
            Some(json!({ "name": "Renamed" })),
        ),
        (Method::DELETE, format!("/projects/{}", project_id), None),
        (
            Method::POST,
            format!("/projects/{}/tasks", project_id),
            Some(json!({ "name": "Sneaky" })),
        ),
    ] {
        let (status, _) = ctx.json(method, &uri, Some(&carol), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} should be admin only", uri);
    }

    ctx.cleanup(&company).await;
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let ctx = TestContext::new().await;
    let alpha = ctx.register("alpha").await;
    let beta = ctx.register("beta").await;

    let (status, _) = ctx
        .json(
            Method::POST,
            "/projects",
            Some(&alpha.token),
            Some(json!({ "name": "Alpha secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx.json(Method::GET, "/projects", Some(&beta.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["projects"].as_array().unwrap().is_empty());

    // Same local part, different tenants, different members
    let (_, alpha_members) = ctx.json(Method::GET, "/members", Some(&alpha.token), None).await;
    let (_, beta_members) = ctx.json(Method::GET, "/members", Some(&beta.token), None).await;
    assert_eq!(alpha_members["members"][0]["email"], alpha.admin_email);
    assert_eq!(beta_members["members"][0]["email"], beta.admin_email);

    // A token whose tenant id is swapped fails validation
    let mut parts = alpha.token.splitn(3, '|');
    let _ = parts.next();
    let forged = format!(
        "{}|{}|{}",
        beta.token.split('|').next().unwrap(),
        parts.next().unwrap(),
        parts.next().unwrap()
    );
    let (status, _) = ctx.json(Method::GET, "/projects", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&alpha).await;
    ctx.cleanup(&beta).await;
}
