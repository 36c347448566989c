//! Credential resolution.
//!
//! A personal access token always wins. Without one, both the login email and
//! the API key must be present for Basic auth. Partial credentials are never
//! combined.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use confluence_bridge_shared::{BridgeError, ConnectionConfig, Result};

/// The authorization scheme used for one tool invocation.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer { token: String },
    /// `Authorization: Basic base64(<login>:<secret>)`.
    Basic { login: String, secret: String },
}

impl Credential {
    /// Scheme name as used in the `Authorization` header.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Bearer { .. } => "Bearer",
            Self::Basic { .. } => "Basic",
        }
    }

    /// Full `Authorization` header value.
    pub fn header_value(&self) -> String {
        match self {
            Self::Bearer { token } => format!("Bearer {token}"),
            Self::Basic { login, secret } => {
                let encoded = STANDARD.encode(format!("{login}:{secret}"));
                format!("Basic {encoded}")
            }
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"<redacted>").finish(),
            Self::Basic { login, .. } => f
                .debug_struct("Basic")
                .field("login", login)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Pick the credential scheme from the connection settings.
pub fn resolve_credential(conn: &ConnectionConfig) -> Result<Credential> {
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);

    if let Some(token) = present(&conn.personal_token) {
        return Ok(Credential::Bearer { token });
    }

    match (present(&conn.api_mail), present(&conn.api_key)) {
        (Some(login), Some(secret)) => Ok(Credential::Basic { login, secret }),
        _ => Err(BridgeError::config(
            "no credentials configured: set CONFLUENCE_PERSONAL_TOKEN, \
             or both CONFLUENCE_API_MAIL and CONFLUENCE_API_KEY",
        )),
    }
}
