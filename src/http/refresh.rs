use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::executor::{HttpExecutor, RawResponse};
use super::request::RequestDescriptor;
use crate::auth::CredentialVault;
use crate::error::SokoError;
use crate::session::{SessionEvent, SessionStore};
use crate::types::user::RefreshResponse;

pub const REFRESH_PATH: &str = "/users/auth/token/refresh/";

enum Recovery {
    Replay(String),
    GiveUp,
}

/// Executes requests with the stored bearer token and recovers from a 401
/// by exchanging the refresh token and replaying once.
///
/// Concurrent 401s queue on a single lock. Whoever gets it second finds the
/// vault already holding a newer access token and replays with that instead
/// of refreshing again.
pub struct RefreshCoordinator {
    executor: HttpExecutor,
    vault: Arc<CredentialVault>,
    session: SessionStore,
    refresh_lock: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(executor: HttpExecutor, vault: Arc<CredentialVault>, session: SessionStore) -> Self {
        Self {
            executor,
            vault,
            session,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn executor(&self) -> &HttpExecutor {
        &self.executor
    }

    /// Send `request`. Anonymous requests bypass tokens and refresh entirely.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, SokoError> {
        if !request.authenticated {
            return self.executor.send(request, None).await;
        }

        let token = self.vault.access_token()?;
        let response = self.executor.send(request, token.as_deref()).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        match self.recover(token.as_deref()).await? {
            Recovery::Replay(fresh) => {
                debug!(path = %request.path, "Replaying request with refreshed token");
                self.executor.send(request, Some(&fresh)).await
            }
            Recovery::GiveUp => Ok(response),
        }
    }

    async fn recover(&self, failed_token: Option<&str>) -> Result<Recovery, SokoError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.vault.access_token()?;
        if let Some(current) = current {
            if Some(current.as_str()) != failed_token {
                debug!("Access token already refreshed by another request");
                return Ok(Recovery::Replay(current));
            }
        }

        let Some(refresh_token) = self.vault.refresh_token()? else {
            return Ok(Recovery::GiveUp);
        };

        match self.exchange(&refresh_token).await {
            Some(refreshed) => {
                let access = refreshed.access.unwrap_or_default();
                self.vault.rotate(access.clone(), refreshed.refresh)?;
                info!("Access token refreshed");
                Ok(Recovery::Replay(access))
            }
            None => {
                warn!("Token refresh failed; clearing credentials");
                if let Err(err) = self.vault.purge() {
                    warn!(error = %err, "Failed to remove stored credentials");
                }
                self.session.dispatch(SessionEvent::LoggedOut);
                Ok(Recovery::GiveUp)
            }
        }
    }

    /// `Some` only for a 2xx response carrying a non-empty `access`.
    async fn exchange(&self, refresh_token: &str) -> Option<RefreshResponse> {
        let request = RequestDescriptor::post(REFRESH_PATH)
            .anonymous()
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .ok()?;

        let response = match self.executor.send(&request, None).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Token refresh request failed");
                return None;
            }
        };
        if !response.is_success() {
            debug!(status = response.status, "Token refresh rejected");
            return None;
        }

        serde_json::from_value::<RefreshResponse>(response.body)
            .ok()
            .filter(|refreshed| refreshed.access.as_deref().is_some_and(|a| !a.is_empty()))
    }
}
