//! # TenantFlow Shared Library
//!
//! Core of the TenantFlow multi-tenant project-management API: tenant
//! resolution, per-request database routing and composite bearer tokens.
//!
//! ## Module Organization
//!
//! - `db`: Landlord pool, tenant connection router, embedded migrations
//! - `models`: Landlord (users, tenants) and tenant (members, projects, tasks,
//!   access tokens) models
//! - `auth`: Credential hashing, token codec and the auth resolver
//! - `tenancy`: Tenant database provisioning

pub mod auth;
pub mod db;
pub mod models;
pub mod tenancy;

/// Current version of the TenantFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
