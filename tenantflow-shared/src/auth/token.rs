/// Composite bearer tokens
///
/// A bearer token names the tenant and principal it belongs to, so the
/// resolver can route to the right tenant database before looking the token
/// up:
///
/// ```text
/// {tenant_id}|{principal_id}|{secret}
/// 42|7|Xc9kq1bZ0rT5...   (40 alphanumeric characters of secret)
/// ```
///
/// Only the SHA-256 of the *whole* string is stored (`access_tokens.token_hash`),
/// so the plaintext is returned exactly once, at issue time. The codec itself
/// never touches storage.
///
/// # Example
///
/// ```
/// use tenantflow_shared::auth::token::{hash_token, CompositeToken};
///
/// let token = CompositeToken::issue(42, 7);
/// let plaintext = token.to_string();
///
/// let decoded: CompositeToken = plaintext.parse().unwrap();
/// assert_eq!(decoded.tenant_id, 42);
/// assert_eq!(decoded.principal_id, 7);
/// assert_eq!(hash_token(&plaintext).len(), 64);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of the random secret (characters)
pub const SECRET_LENGTH: usize = 40;

/// Field separator
const SEPARATOR: char = '|';

/// Ability granted to every token issued at login or registration
pub const WILDCARD_ABILITY: &str = "*";

/// Error decoding a bearer token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,
}

/// Decoded `tenant_id|principal_id|secret` triple
#[derive(Clone, PartialEq, Eq)]
pub struct CompositeToken {
    pub tenant_id: i64,
    pub principal_id: i64,
    pub secret: String,
}

impl CompositeToken {
    /// Issues a token with a fresh 40-character secret
    pub fn issue(tenant_id: i64, principal_id: i64) -> Self {
        Self {
            tenant_id,
            principal_id,
            secret: generate_secret(SECRET_LENGTH),
        }
    }

    /// Decodes the text form
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MalformedToken` unless the input has exactly three
    /// `|`-separated fields, the first two being non-negative decimal integers
    /// and the last a non-empty secret.
    pub fn decode(raw: &str) -> Result<Self, TokenError> {
        let mut parts = raw.splitn(3, SEPARATOR);
        let (Some(tenant), Some(principal), Some(secret)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::MalformedToken);
        };

        if secret.is_empty() || secret.contains(SEPARATOR) {
            return Err(TokenError::MalformedToken);
        }

        Ok(Self {
            tenant_id: parse_id(tenant)?,
            principal_id: parse_id(principal)?,
            secret: secret.to_string(),
        })
    }

    /// SHA-256 of the encoded token, as stored in `access_tokens.token_hash`
    pub fn hash(&self) -> String {
        hash_token(&self.to_string())
    }
}

impl fmt::Display for CompositeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.tenant_id,
            self.principal_id,
            self.secret,
            sep = SEPARATOR
        )
    }
}

// Keep the secret out of logs.
impl fmt::Debug for CompositeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeToken")
            .field("tenant_id", &self.tenant_id)
            .field("principal_id", &self.principal_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl FromStr for CompositeToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// `str::parse::<i64>` also accepts a leading `+`, so check digits first.
fn parse_id(field: &str) -> Result<i64, TokenError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::MalformedToken);
    }
    field.parse().map_err(|_| TokenError::MalformedToken)
}

/// Generates a random alphanumeric string (A-Z, a-z, 0-9)
fn generate_secret(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a plaintext bearer token using SHA-256
///
/// Returns 64 lowercase hex characters.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
