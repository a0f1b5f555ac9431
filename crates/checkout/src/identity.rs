//! Identity provider boundary and request sessions.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use domain::UserId;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A verified identity from the hosted identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: UserId,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            email_verified,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name: the given name, else the local part of the email.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Guest,
    Authenticated(Identity),
}

impl Session {
    /// Returns the signed-in identity. The `guest` sentinel uid counts as
    /// no identity.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Authenticated(identity) if !identity.uid.is_guest() => Some(identity),
            _ => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.identity().is_none()
    }
}

impl From<Option<Identity>> for Session {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Session::Guest, Session::Authenticated)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Identity token has expired")]
    Expired,

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),
}

/// Verifies bearer tokens issued by the identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Claims carried by identity tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
}

/// HS256 identity tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a token for `identity` that expires after `ttl`.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, IdentityError> {
        let claims = Claims {
            sub: identity.uid.to_string(),
            email: identity.email.clone(),
            email_verified: identity.email_verified,
            name: identity.name.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Identity, IdentityError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(IdentityError::InvalidToken("missing subject".to_string()));
        }

        Ok(Identity {
            uid: UserId::new(claims.sub),
            email: claims.email,
            email_verified: claims.email_verified,
            name: claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issued_token_authenticates() {
        let provider = JwtIdentityProvider::new(b"test-secret");
        let identity = Identity::new("uid-1", "asha@example.in", true).with_name("Asha");

        let token = provider.issue(&identity, Duration::minutes(5)).unwrap();
        let verified = provider.authenticate(&token).await.unwrap();

        assert_eq!(verified, identity);
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let issuer = JwtIdentityProvider::new(b"one");
        let verifier = JwtIdentityProvider::new(b"two");
        let token = issuer
            .issue(&Identity::new("uid-1", "a@b.in", false), Duration::minutes(5))
            .unwrap();

        let result = verifier.authenticate(&token).await;
        assert!(matches!(result, Err(IdentityError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let provider = JwtIdentityProvider::new(b"test-secret");
        let token = provider
            .issue(&Identity::new("uid-1", "a@b.in", true), Duration::hours(-2))
            .unwrap();

        assert_eq!(
            provider.authenticate(&token).await,
            Err(IdentityError::Expired)
        );
    }

    #[test]
    fn test_guest_sentinel_is_not_an_identity() {
        let sentinel = Session::Authenticated(Identity::new("guest", "", false));
        assert!(sentinel.is_guest());
        assert!(Session::Guest.is_guest());
        assert!(!Session::from(Some(Identity::new("uid-1", "a@b.in", true))).is_guest());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let identity = Identity::new("uid-1", "meera.iyer@example.in", true);
        assert_eq!(identity.display_name(), "meera.iyer");
    }
}
