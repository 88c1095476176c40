/// Middleware modules for the API server
///
/// - `tenant_auth`: Resolves the bearer token to a tenant-scoped member and
///   attaches the request's `TenantContext`

pub mod tenant_auth;
