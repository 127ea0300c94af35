//! Identity resolution for incoming connections.
//!
//! Authentication itself is an external collaborator: the engine only calls
//! this trait once per connection, before the connection is admitted to any
//! room, and never consults it again.

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

/// Resolved identity bound to one connection for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Stable user identifier.
    pub user_id: Uuid,
    /// Display name broadcast in room events.
    pub name: String,
}

/// Rejection raised when a token does not resolve to an identity.
#[derive(Debug, Clone, Error)]
#[error("identity resolution failed: {reason}")]
pub struct IdentityError {
    /// Why the token was rejected.
    pub reason: String,
}

/// Abstraction over the external authentication collaborator.
pub trait IdentityResolver: Send + Sync {
    /// Resolve an opaque connection token into an identity, or reject it.
    fn resolve(&self, token: &str) -> BoxFuture<'static, Result<UserIdentity, IdentityError>>;
}

/// Development resolver accepting self-describing `<uuid>:<name>` tokens.
///
/// Deployments plug a real resolver in through [`IdentityResolver`]; this
/// keeps the engine runnable (and testable) without an auth service.
#[derive(Debug, Default)]
pub struct DevIdentityResolver;

impl IdentityResolver for DevIdentityResolver {
    fn resolve(&self, token: &str) -> BoxFuture<'static, Result<UserIdentity, IdentityError>> {
        let parsed = parse_dev_token(token);
        Box::pin(async move { parsed })
    }
}

fn parse_dev_token(token: &str) -> Result<UserIdentity, IdentityError> {
    let (id, name) = token.split_once(':').ok_or_else(|| IdentityError {
        reason: "token must be `<uuid>:<name>`".into(),
    })?;

    let user_id = Uuid::parse_str(id).map_err(|_| IdentityError {
        reason: "token user id is not a uuid".into(),
    })?;

    if name.trim().is_empty() {
        return Err(IdentityError {
            reason: "token name is blank".into(),
        });
    }

    Ok(UserIdentity {
        user_id,
        name: name.to_string(),
    })
}
