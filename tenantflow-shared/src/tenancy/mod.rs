/// Tenant lifecycle
///
/// - `provisioner`: Creates tenant databases, applies the tenant schema and
///   seeds the first admin member
/// - `demo`: Sample members, projects and tasks for development installs
pub mod demo;
pub mod provisioner;
