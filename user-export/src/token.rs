use crate::error::{ExportError, ExportResult};
use chrono::{DateTime, Utc};
use config::PlatformConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Subtracted from a credential's lifetime so a token never expires mid-request.
pub const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Bearer credential issued by the client-credentials exchange.
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub issued_at: DateTime<Utc>,
    pub ttl: Duration
}

impl Credential {
    pub fn expires_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.issued_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let expires_at = self.expires_at();
        let deadline = chrono::Duration::from_std(margin)
            .ok()
            .and_then(|margin| expires_at.checked_sub_signed(margin))
            .unwrap_or(expires_at);
        now >= deadline
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"***")
            .field("issued_at", &self.issued_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>
}

/// Acquires and caches the bearer credential used by every listing request.
pub struct TokenProvider {
    http_client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<Credential>>
}

impl TokenProvider {
    pub fn new(http_client: Client, platform: &PlatformConfig) -> Self {
        Self {
            http_client,
            token_url: platform.auth_url(),
            client_id: platform.client_id.clone(),
            client_secret: platform.client_secret.clone(),
            cached: RwLock::new(None)
        }
    }

    /// Returns the cached credential, exchanging for a new one when there is
    /// none or it is within [`TOKEN_EXPIRY_MARGIN`] of expiry.
    pub async fn get_token(&self) -> ExportResult<Credential> {
        {
            let cached = self.cached.read().await;
            if let Some(ref credential) = *cached {
                if !credential.is_expired_at(Utc::now(), TOKEN_EXPIRY_MARGIN) {
                    return Ok(credential.clone());
                }
                debug!(expires_at = %credential.expires_at(), "Cached credential expired");
            }
        }

        self.refresh().await
    }

    /// Discards the cached credential and performs a fresh exchange.
    pub async fn refresh(&self) -> ExportResult<Credential> {
        let mut cached = self.cached.write().await;
        *cached = None;

        let credential = self.exchange().await?;
        *cached = Some(credential.clone());
        Ok(credential)
    }

    async fn exchange(&self) -> ExportResult<Credential> {
        info!(url = %self.token_url, "Requesting OAuth client-credentials token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| ExportError::AuthError(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            return Err(ExportError::AuthError(format!(
                "Token request failed: {} - {}",
                status, error_body
            )));
        }

        let token_response: OAuthTokenResponse = response.json().await.map_err(|e| {
            ExportError::AuthError(format!("Failed to parse token response: {}", e))
        })?;

        let access_token = token_response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ExportError::AuthError("Token response is missing access_token".to_string())
            })?;
        let expires_in = token_response.expires_in.ok_or_else(|| {
            ExportError::AuthError("Token response is missing expires_in".to_string())
        })?;

        info!(expires_in, "Authenticated with Genesys Cloud");

        Ok(Credential {
            access_token,
            issued_at: Utc::now(),
            ttl: Duration::from_secs(expires_in)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(issued_at: DateTime<Utc>, ttl_secs: u64) -> Credential {
        Credential {
            access_token: "token".to_string(),
            issued_at,
            ttl: Duration::from_secs(ttl_secs)
        }
    }

    #[test]
    fn test_fresh_credential_not_expired() {
        let now = Utc::now();
        let cred = credential(now, 3600);
        assert!(!cred.is_expired_at(now, TOKEN_EXPIRY_MARGIN));
    }

    #[test]
    fn test_credential_expired_inside_margin() {
        let issued = Utc::now();
        let cred = credential(issued, 3600);
        let almost = issued + chrono::Duration::seconds(3590);
        assert!(cred.is_expired_at(almost, TOKEN_EXPIRY_MARGIN));
        assert!(!cred.is_expired_at(almost, Duration::ZERO));
    }

    #[test]
    fn test_credential_expired_exactly_at_ttl() {
        let issued = Utc::now();
        let cred = credential(issued, 60);
        assert!(cred.is_expired_at(issued + chrono::Duration::seconds(60), Duration::ZERO));
    }

    #[test]
    fn test_debug_hides_token() {
        let cred = credential(Utc::now(), 60);
        assert!(!format!("{:?}", cred).contains("\"token\""));
        assert_eq!(cred.bearer(), "Bearer token");
    }
}
