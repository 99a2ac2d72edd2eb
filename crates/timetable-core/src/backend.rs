// ── Backend context ──
//
// Built once at startup from a `BackendConfig` and passed down. Owns the
// shared HTTP client; repositories and list view-models borrow it.

use std::sync::Arc;

use tracing::{info, warn};

use timetable_api::{ApiClient, TransportConfig};

use crate::config::BackendConfig;
use crate::error::CoreError;
use crate::model::{AccessKey, Entity};
use crate::paging::PagerConfig;
use crate::repository::Repository;
use crate::view_model::TableViewModel;

#[derive(Debug, Clone)]
pub struct Backend {
    client: Arc<ApiClient>,
    paging: PagerConfig,
}

impl Backend {
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let mut transport = TransportConfig::default().with_timeout(config.timeout);
        transport.accept_invalid_certs = config.accept_invalid_certs;
        if let Some(token) = &config.access_token {
            transport = transport.with_access_token(token.clone());
        }

        let client = ApiClient::new(config.url.as_str(), &transport)?;
        Ok(Self::from_client(client, config.paging))
    }

    /// Wrap a pre-built client.
    pub fn from_client(client: ApiClient, paging: PagerConfig) -> Self {
        Self {
            client: Arc::new(client),
            paging,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn pager_config(&self) -> PagerConfig {
        self.paging
    }

    pub fn repository<E: Entity>(&self) -> Arc<Repository<E>> {
        Arc::new(Repository::new(Arc::clone(&self.client)))
    }

    /// Ask the backend for a new registration key.
    pub async fn generate_access_key(&self) -> Result<AccessKey, CoreError> {
        let response = self
            .client
            .generate_access_key()
            .await
            .map_err(CoreError::from)
            .inspect_err(|e| warn!(error = %e, "access key generation failed"))?;

        let key = AccessKey::try_from(response)?;
        info!(expires_at = %key.expires_at, "access key issued");
        Ok(key)
    }

    /// List view-model over a fresh repository.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn table<E: Entity>(&self) -> TableViewModel<E> {
        TableViewModel::new(self.repository(), self.paging)
    }
}
