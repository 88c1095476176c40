/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and logout
/// - `members`: Tenant member management
/// - `projects`: Projects (tenant database)
/// - `tasks`: Tasks nested under projects

pub mod auth;
pub mod health;
pub mod members;
pub mod projects;
pub mod tasks;
