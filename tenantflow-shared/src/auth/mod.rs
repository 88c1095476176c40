/// Authentication for TenantFlow
///
/// # Modules
///
/// - [`password`]: Argon2id credential hashing behind the [`password::CredentialHasher`] trait
/// - [`token`]: Composite `tenant_id|member_id|secret` bearer tokens
/// - [`resolver`]: Login, per-request token validation, logout and company registration
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id, cost parameters embedded in each hash
/// - **Bearer Tokens**: 40-character random secret, only the SHA-256 of the whole token is stored
/// - **Tenant Binding**: tokens are looked up in the tenant database named by the token
///   and must match both hash and principal
///
/// # Example
///
/// ```
/// use tenantflow_shared::auth::token::{hash_token, CompositeToken};
///
/// let token = CompositeToken::issue(1, 42);
/// let decoded: CompositeToken = token.to_string().parse().unwrap();
/// assert_eq!(decoded.principal_id, 42);
/// assert_eq!(hash_token(&token.to_string()), token.hash());
/// ```

pub mod password;
pub mod resolver;
pub mod token;
