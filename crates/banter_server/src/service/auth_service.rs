use banter_domain::UserId;
use serde::Deserialize;

use super::Service;
use crate::{Error, Result};

/// Subject information returned by the identity provider.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
}

/// The identity verifier: resolves a bearer credential to a stable user
/// identifier. Verification itself is owned by the identity provider; any
/// failure along the way reads as `Unauthenticated`.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<UserId>;
}

impl Service {
    pub fn auth_service(tokeninfo_url: impl Into<String>) -> impl AuthService {
        Live::new(tokeninfo_url.into())
    }
}

struct Live {
    tokeninfo_url: String,
    client: reqwest::Client,
}

impl Live {
    fn new(tokeninfo_url: String) -> Self {
        Self {
            tokeninfo_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for Live {
    async fn verify(&self, credential: &str) -> Result<UserId> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .header("Authorization", format!("Bearer {}", credential))
            .send()
            .await
            .map_err(|_| Error::Unauthenticated)?;

        if !response.status().is_success() {
            return Err(Error::Unauthenticated);
        }

        let info: TokenInfo = response.json().await.map_err(|_| Error::Unauthenticated)?;

        Ok(UserId::new(info.sub))
    }
}
