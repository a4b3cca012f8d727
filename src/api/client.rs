use std::sync::Arc;

use tracing::{debug, warn};

use super::{Mutation, Query, QueryState};
use crate::auth::{CredentialStore, CredentialVault, FileCredentialStore};
use crate::cache::{CacheKey, EntryStatus, QueryCache};
use crate::config::SokoConfig;
use crate::error::{ErrorInfo, SokoError};
use crate::http::{build_client, HttpExecutor, RefreshCoordinator};
use crate::session::{Session, SessionStore};

struct ClientInner {
    config: SokoConfig,
    coordinator: RefreshCoordinator,
    vault: Arc<CredentialVault>,
    session: SessionStore,
    cache: QueryCache,
}

/// Marketplace API client.
///
/// Cheap to clone; clones share credentials, session and cache.
///
/// Construction rehydrates persisted credentials: a stored access token
/// makes the session optimistically authenticated until
/// [`restore_session`](ApiClient::restore_session) confirms it.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Client backed by the credentials file for `config.profile`.
    pub fn new(config: SokoConfig) -> Result<Self, SokoError> {
        let store = FileCredentialStore::new(config.credentials_dir.clone())
            .with_profile(&config.profile);
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(
        config: SokoConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, SokoError> {
        config.validate()?;
        let client = build_client(config.request_timeout)?;
        let executor = HttpExecutor::new(client, config.base_url.clone());

        let vault = Arc::new(CredentialVault::new(store));
        let has_token = match vault.rehydrate() {
            Ok(credentials) => credentials.is_some(),
            Err(err) => {
                warn!(error = %err, "Failed to load stored credentials");
                false
            }
        };
        let session = SessionStore::new(Session::rehydrated(has_token));
        let coordinator = RefreshCoordinator::new(executor, vault.clone(), session.clone());
        let cache = QueryCache::new(config.cache_capacity);

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                coordinator,
                vault,
                session,
                cache,
            }),
        })
    }

    pub fn config(&self) -> &SokoConfig {
        &self.inner.config
    }

    pub fn credentials(&self) -> &CredentialVault {
        &self.inner.vault
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Run a query, serving a fresh cached result when one exists.
    pub async fn query<Q: Query>(&self, args: &Q::Args) -> Result<Q::Output, SokoError> {
        let key = CacheKey::new(Q::NAME, args)?;
        if let Some(hit) = self.inner.cache.lookup::<Q::Output>(&key) {
            if hit.status == EntryStatus::Fresh {
                if let Some(data) = hit.data {
                    debug!(key = %key, "Cache hit");
                    return Ok(data);
                }
            }
        }
        self.fetch::<Q>(key, args).await
    }

    /// Run a query against the server regardless of cache state.
    pub async fn refetch<Q: Query>(&self, args: &Q::Args) -> Result<Q::Output, SokoError> {
        let key = CacheKey::new(Q::NAME, args)?;
        self.fetch::<Q>(key, args).await
    }

    /// Snapshot of the cache entry for `args`, without fetching.
    pub fn query_state<Q: Query>(&self, args: &Q::Args) -> Result<QueryState<Q::Output>, SokoError> {
        let key = CacheKey::new(Q::NAME, args)?;
        let Some(entry) = self.inner.cache.lookup::<Q::Output>(&key) else {
            return Ok(QueryState::default());
        };
        let is_fetching = entry.status == EntryStatus::Fetching;
        Ok(QueryState {
            is_loading: is_fetching && entry.data.is_none(),
            is_fetching,
            is_error: entry.status == EntryStatus::Failed,
            error: entry.error,
            data: entry.data,
        })
    }

    /// Run a mutation and invalidate the tags it names. Nothing is
    /// invalidated when it fails.
    pub async fn mutate<M: Mutation>(&self, args: &M::Args) -> Result<M::Output, SokoError> {
        M::validate(args)?;
        let request = M::request(args)?;
        let response = self.inner.coordinator.execute(&request).await?;
        let output = M::transform(response.into_result()?)?;

        let tags = M::invalidates_tags(args, &output);
        let stale = self.inner.cache.invalidate(&tags);
        debug!(mutation = M::NAME, stale, "Mutation completed");
        Ok(output)
    }

    async fn fetch<Q: Query>(&self, key: CacheKey, args: &Q::Args) -> Result<Q::Output, SokoError> {
        let request = Q::request(args)?;
        let generation = self.inner.cache.begin_fetch(&key);

        let result = match self.inner.coordinator.execute(&request).await {
            Ok(response) => response.into_result().and_then(Q::transform),
            Err(err) => Err(err),
        };
        match result {
            Ok(output) => {
                let tags = Q::provides_tags(args, &output);
                self.inner
                    .cache
                    .complete(&key, generation, output.clone(), tags);
                Ok(output)
            }
            Err(err) => {
                debug!(key = %key, error = %err, "Query failed");
                self.inner.cache.fail(&key, ErrorInfo::from(&err));
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("session", &self.inner.session.snapshot().status())
            .finish()
    }
}
