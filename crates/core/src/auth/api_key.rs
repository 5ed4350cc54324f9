//! API Key authentication.

use async_trait::async_trait;

use crate::config::ApiKeyEntry;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that validates requests against the configured API keys.
///
/// Each key carries a user id and a role. Accepts the key in either:
/// - `Authorization: Bearer <key>` header
/// - `X-API-Key: <key>` header
pub struct ApiKeyAuthenticator {
    entries: Vec<ApiKeyEntry>,
}

impl ApiKeyAuthenticator {
    pub fn new(entries: Vec<ApiKeyEntry>) -> Self {
        Self { entries }
    }

    /// Extract API key from request headers.
    /// Checks Authorization: Bearer and X-API-Key headers.
    fn extract_key(&self, request: &AuthRequest) -> Option<String> {
        // Check Authorization: Bearer <key>
        if let Some(auth_header) = request.headers.get("authorization") {
            if let Some(key) = auth_header.strip_prefix("Bearer ") {
                return Some(key.to_string());
            }
            // Also support lowercase
            if let Some(key) = auth_header.strip_prefix("bearer ") {
                return Some(key.to_string());
            }
        }

        // Check X-API-Key header
        if let Some(key) = request.headers.get("x-api-key") {
            return Some(key.clone());
        }

        None
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided_key = self
            .extract_key(request)
            .ok_or(AuthError::NotAuthenticated)?;

        // Compare against every configured key so the timing does not
        // reveal which entry (if any) was close to matching.
        let mut matched: Option<&ApiKeyEntry> = None;
        for entry in &self.entries {
            if constant_time_eq(provided_key.as_bytes(), entry.key.as_bytes()) {
                matched = Some(entry);
            }
        }

        match matched {
            Some(entry) => Ok(Identity {
                user_id: entry.user_id.clone(),
                role: entry.role,
                method: "api_key".to_string(),
            }),
            None => Err(AuthError::InvalidCredentials("Invalid API key".to_string())),
        }
    }

    fn method_name(&self) -> &'static str {
        "api_key"
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use std::net::IpAddr;

    fn make_request(headers: Vec<(&str, &str)>) -> AuthRequest {
        AuthRequest {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            source_ip: "127.0.0.1".parse::<IpAddr>().unwrap(),
        }
    }

    fn make_auth() -> ApiKeyAuthenticator {
        ApiKeyAuthenticator::new(vec![
            ApiKeyEntry {
                key: "admin-key-123".to_string(),
                user_id: "admin-1".to_string(),
                role: Role::Admin,
            },
            ApiKeyEntry {
                key: "desk-key-456".to_string(),
                user_id: "desk-1".to_string(),
                role: Role::Helpdesk,
            },
        ])
    }

    #[tokio::test]
    async fn test_bearer_token_valid() {
        let auth = make_auth();
        let request = make_request(vec![("Authorization", "Bearer admin-key-123")]);

        let identity = auth.authenticate(&request).await.unwrap();

        assert_eq!(identity.user_id, "admin-1");
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.method, "api_key");
    }

    #[tokio::test]
    async fn test_x_api_key_header_valid() {
        let auth = make_auth();
        let request = make_request(vec![("X-API-Key", "desk-key-456")]);

        let identity = auth.authenticate(&request).await.unwrap();

        assert_eq!(identity.user_id, "desk-1");
        assert_eq!(identity.role, Role::Helpdesk);
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let auth = make_auth();
        let request = make_request(vec![("Authorization", "Bearer wrong-key")]);

        let result = auth.authenticate(&request).await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let auth = make_auth();
        let request = make_request(vec![]);

        let result = auth.authenticate(&request).await;

        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_bearer_lowercase() {
        let auth = make_auth();
        let request = make_request(vec![("Authorization", "bearer admin-key-123")]);

        let identity = auth.authenticate(&request).await.unwrap();
        assert_eq!(identity.user_id, "admin-1");
    }

    #[test]
    fn test_method_name() {
        let auth = ApiKeyAuthenticator::new(vec![]);
        assert_eq!(auth.method_name(), "api_key");
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(!constant_time_eq(b"", b"x"));
        assert!(constant_time_eq(b"", b""));
    }
}
