use std::sync::Arc;

use substation_core::ServiceError;

use crate::token::{DEFAULT_TTL_SECS, DEV_SECRET, TokenAuthenticator};

/// Auth module configuration — a single shared operator credential pair plus
/// the token signing secret.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Operator username. Writes are rejected at login when unset.
    pub username: Option<String>,

    /// Operator password.
    pub password: Option<String>,

    /// Token signing secret. Falls back to [`DEV_SECRET`] when unset.
    pub secret: Option<String>,

    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            secret: None,
            token_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl AuthConfig {
    /// Whether the signing secret is the development fallback.
    pub fn uses_dev_secret(&self) -> bool {
        self.secret.is_none()
    }
}

/// Auth service — checks the operator credential pair and issues tokens.
pub struct AuthService {
    config: AuthConfig,
    authenticator: Arc<TokenAuthenticator>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let secret = config.secret.clone().unwrap_or_else(|| DEV_SECRET.to_string());
        let authenticator = Arc::new(TokenAuthenticator::new(&secret, config.token_ttl_secs));
        Self {
            config,
            authenticator,
        }
    }

    pub fn authenticator(&self) -> Arc<TokenAuthenticator> {
        self.authenticator.clone()
    }

    /// Check the supplied credentials and issue a token.
    ///
    /// Unconfigured credentials are a server misconfiguration (500), not a
    /// client error.
    pub fn login(&self, username: &str, password: &str) -> Result<String, ServiceError> {
        let (Some(expected_user), Some(expected_pass)) =
            (self.config.username.as_deref(), self.config.password.as_deref())
        else {
            return Err(ServiceError::Internal(
                "operator credentials are not configured".into(),
            ));
        };

        if username != expected_user || password != expected_pass {
            tracing::warn!(username, "rejected login attempt");
            return Err(ServiceError::Unauthorized("invalid credentials".into()));
        }

        tracing::info!(username, "operator logged in");
        self.authenticator.issue(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AuthService {
        AuthService::new(AuthConfig {
            username: Some("operator".into()),
            password: Some("hunter2".into()),
            secret: Some("unit-test-secret".into()),
            token_ttl_secs: DEFAULT_TTL_SECS,
        })
    }

    #[test]
    fn login_issues_verifiable_token() {
        let svc = configured();
        let token = svc.login("operator", "hunter2").unwrap();
        let claims = svc.authenticator().verify(&token).unwrap();
        assert_eq!(claims.sub, "operator");
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let svc = configured();
        let err = svc.login("operator", "wrong").unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
        let err = svc.login("intruder", "hunter2").unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
    }

    #[test]
    fn login_without_configured_credentials_is_internal() {
        let svc = AuthService::new(AuthConfig::default());
        let err = svc.login("operator", "hunter2").unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL");
    }

    #[test]
    fn dev_secret_fallback_flagged() {
        assert!(AuthConfig::default().uses_dev_secret());
    }
}
