/// Demo data for development tenants
///
/// Fills a provisioned tenant database with two regular members and two
/// projects of five tasks each, so a fresh install has something to click
/// through. Seeding is additive and idempotent: members are matched by email
/// and projects are only created while the tenant has none.
///
/// Demo members log in as `member1@<domain>.com` and `member2@<domain>.com`
/// with [`DEMO_PASSWORD`].

use rand::Rng;
use tracing::{debug, info};

use crate::db::router::TenantDb;
use crate::models::member::{CreateMember, Member, MemberRole};
use crate::models::project::Project;
use crate::models::task::Task;
use crate::models::tenant::Tenant;

/// Plaintext password of every demo member
pub const DEMO_PASSWORD: &str = "password123";

const DEMO_MEMBERS: usize = 2;
const DEMO_PROJECTS: usize = 2;
const TASKS_PER_PROJECT: usize = 5;

/// Row counts of a tenant database after seeding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub members: usize,
    pub projects: usize,
    pub tasks: usize,
}

/// Email of the `index`-th demo member (1-based)
pub fn demo_member_email(tenant: &Tenant, index: usize) -> String {
    format!("member{}@{}.com", index, tenant.domain)
}

/// Seeds demo members, projects and tasks into `db`
///
/// `password_hash` is stored for every demo member.
///
/// # Errors
///
/// Returns the first database error; rows written before it are kept.
pub async fn seed_demo_data(
    db: &TenantDb,
    tenant: &Tenant,
    password_hash: &str,
) -> Result<DemoSummary, sqlx::Error> {
    let pool = db.pool();

    for index in 1..=DEMO_MEMBERS {
        Member::create_if_absent(
            pool,
            CreateMember {
                tenant_id: tenant.id,
                name: format!("Member {}", index),
                email: demo_member_email(tenant, index),
                password_hash: password_hash.to_string(),
                role: MemberRole::Member,
            },
        )
        .await?;
    }

    if Project::list(pool, tenant.id).await?.is_empty() {
        for index in 1..=DEMO_PROJECTS {
            let project =
                Project::create(pool, tenant.id, &format!("{} Project {}", tenant.name, index))
                    .await?;

            for task in 1..=TASKS_PER_PROJECT {
                let duration = rand::thread_rng().gen_range(1..=10);
                Task::create(
                    pool,
                    project.id,
                    &format!("Task {} - {}", task, project.name),
                    duration,
                )
                .await?;
            }
        }
    } else {
        debug!(tenant_id = tenant.id, "Tenant already has projects, skipping demo projects");
    }

    let members = Member::list(pool, tenant.id).await?.len();
    let projects = Project::list(pool, tenant.id).await?;
    let mut tasks = 0;
    for project in &projects {
        tasks += Task::list_for_project(pool, project.id).await?.len();
    }

    let summary = DemoSummary {
        members,
        projects: projects.len(),
        tasks,
    };

    info!(
        tenant_id = tenant.id,
        database = db.database(),
        members = summary.members,
        projects = summary.projects,
        tasks = summary.tasks,
        "Demo data seeded"
    );

    Ok(summary)
}
