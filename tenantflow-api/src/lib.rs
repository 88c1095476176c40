//! # TenantFlow API Server Library
//!
//! HTTP surface of the multi-tenant project management service. Every
//! authenticated request is routed to its tenant's own database through the
//! bearer token `{tenant_id}|{member_id}|{secret}`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Tenant authentication
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
