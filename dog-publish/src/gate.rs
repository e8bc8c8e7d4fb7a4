use std::collections::HashMap;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

/// Role a token must carry to edit or publish.
pub const AUTHOR_ROLE: &str = "author";

/// Request metadata the gate inspects. Header names are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn bearer<T: AsRef<str>>(token: T) -> Self {
        Self::new().with_header("authorization", format!("Bearer {}", token.as_ref()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Token from `Authorization: Bearer <token>`.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?.trim();
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
            return None;
        }
        Some(token)
    }
}

/// Proof that a caller may author content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCapability {
    pub subject: String,
}

/// Decides whether a caller may use the editing entry points.
///
/// Checked before any validation, staging or upload work.
pub trait SessionGate: Send + Sync {
    fn authorize(&self, request: &AuthRequest) -> Option<AuthorCapability>;

    fn is_authorized(&self, request: &AuthRequest) -> bool {
        self.authorize(request).is_some()
    }
}

/// Fixed set of bearer tokens, each mapped to the subject it authenticates.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenGate {
    tokens: HashMap<String, String>,
}

impl StaticTokenGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token<T: Into<String>, S: Into<String>>(mut self, token: T, subject: S) -> Self {
        self.tokens.insert(token.into(), subject.into());
        self
    }

    /// Parse `token=subject` pairs separated by commas; a bare token is its own subject.
    pub fn from_pairs(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .fold(Self::new(), |gate, pair| match pair.split_once('=') {
                Some((token, subject)) => gate.with_token(token.trim(), subject.trim()),
                None => gate.with_token(pair, pair),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl SessionGate for StaticTokenGate {
    fn authorize(&self, request: &AuthRequest) -> Option<AuthorCapability> {
        let token = request.bearer_token()?;
        self.tokens.get(token).map(|subject| AuthorCapability {
            subject: subject.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GateClaims {
    sub: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

/// HS256 JWTs carrying the author role in `role` or `roles`.
pub struct JwtGate {
    key: DecodingKey,
    validation: Validation,
    role: String,
}

impl JwtGate {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            role: AUTHOR_ROLE.to_string(),
        }
    }

    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }
}

impl SessionGate for JwtGate {
    fn authorize(&self, request: &AuthRequest) -> Option<AuthorCapability> {
        let token = request.bearer_token()?;
        let claims = match decode::<GateClaims>(token, &self.key, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                debug!(error = %err, "bearer token rejected");
                return None;
            }
        };

        let has_role = claims.role.as_deref() == Some(self.role.as_str())
            || claims.roles.iter().any(|r| r == &self.role);
        if !has_role {
            debug!(sub = %claims.sub, "token lacks the author role");
            return None;
        }
        Some(AuthorCapability { subject: claims.sub })
    }
}
