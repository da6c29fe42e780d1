//! Session credential acquisition against the server's admin login endpoint.
//!
//! The server hands out a session token in a `Set-Cookie` header after a
//! form login. Tokens are good for roughly an hour, but the expiry the server
//! attaches is the source of truth; nothing here assumes a fixed duration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login response carried no Set-Cookie header")]
    MissingCookie,

    #[error("malformed session cookie: {0}")]
    MalformedCookie(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// A session token plus the expiry the server attached to it.
#[derive(Debug, Clone)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Render the `Cookie` header value the server expects on the socket
    /// upgrade request.
    pub fn cookie_header(&self) -> String {
        format!("user=\"{}\"", self.token)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Source of a valid session credential, called before every connection
/// attempt. A seam so the connection manager can be exercised without HTTP.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn ensure_credential(&self) -> Result<Credential>;
}

/// Owns the credential and the re-authentication policy.
pub struct SessionManager {
    http: reqwest::Client,
    address: String,
    password: String,
    /// Held across the login call, so concurrent callers wait for the
    /// in-flight attempt instead of issuing duplicate logins.
    credential: Mutex<Option<Credential>>,
}

impl SessionManager {
    /// Create a manager for the server at `address` (host or host:port).
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            address: address.into(),
            password: password.into(),
            credential: Mutex::new(None),
        }
    }

    async fn authenticate(&self) -> Result<Credential> {
        info!("Authenticating with server at http://{}", self.address);

        let response = self
            .http
            .post(format!("http://{}/admin/login", self.address))
            .form(&[
                ("user", "admin"),
                ("password", self.password.as_str()),
                ("submit", ""),
            ])
            .send()
            .await?;

        let cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .ok_or(AuthError::MissingCookie)?
            .to_str()
            .map_err(|_| AuthError::MalformedCookie("non-ASCII header value".into()))?;

        let credential = parse_session_cookie(cookie)?;
        debug!("Session credential valid until {}", credential.expires_at());
        Ok(credential)
    }

    #[cfg(test)]
    pub(crate) async fn prime(&self, credential: Credential) {
        *self.credential.lock().await = Some(credential);
    }
}

#[async_trait]
impl CredentialSource for SessionManager {
    /// Return the cached credential when still valid, otherwise log in again.
    async fn ensure_credential(&self) -> Result<Credential> {
        let mut held = self.credential.lock().await;

        if let Some(credential) = held.as_ref() {
            if !credential.is_expired(Utc::now()) {
                return Ok(credential.clone());
            }
            debug!("Session credential expired, re-authenticating");
        }

        let fresh = self.authenticate().await?;
        *held = Some(fresh.clone());
        Ok(fresh)
    }
}

/// Parse the server's session cookie.
///
/// The value looks like `user="<token>"; Expires=<date>; ...`: the token sits
/// between the `"` characters of the first attribute, and the expiry is the
/// second `;`-separated attribute, a `name=value` pair whose value is an
/// RFC 2822 date.
fn parse_session_cookie(cookie: &str) -> Result<Credential> {
    let mut attributes = cookie.split(';');

    let token = attributes
        .next()
        .and_then(|first| first.split('"').nth(1))
        .ok_or_else(|| AuthError::MalformedCookie("token not found in first attribute".into()))?;

    let expires = attributes
        .next()
        .and_then(|attr| attr.splitn(2, '=').nth(1))
        .ok_or_else(|| AuthError::MalformedCookie("missing expiry attribute".into()))?;

    let expires_at = DateTime::parse_from_rfc2822(expires.trim())
        .map_err(|e| AuthError::MalformedCookie(format!("bad expiry date {expires:?}: {e}")))?
        .with_timezone(&Utc);

    Ok(Credential::new(token, expires_at))
}
