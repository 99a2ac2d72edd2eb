// ── Repositories ──
//
// One repository per entity type. It hands out paging sources bound to a
// filter and remembers the most recent one as the active source; every
// successful mutation invalidates it so the list showing it reloads.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures_util::future;
use tracing::{info, warn};

use timetable_api::ApiClient;

use crate::error::CoreError;
use crate::model::{Entity, EntityId, FilterOf, RequestOf};
use crate::paging::{Pager, PagerConfig, PagingSource, ResourceFetcher};

pub struct Repository<E: Entity> {
    client: Arc<ApiClient>,
    active: ArcSwapOption<PagingSource<E>>,
}

impl<E: Entity> Repository<E> {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            active: ArcSwapOption::empty(),
        }
    }

    /// New source over `filter`, which becomes the active source.
    pub fn paging_source(&self, filter: FilterOf<E>) -> Arc<PagingSource<E>> {
        let fetcher = ResourceFetcher::<E>::new(Arc::clone(&self.client), filter);
        let source = Arc::new(PagingSource::new(fetcher));
        self.active.store(Some(Arc::clone(&source)));
        source
    }

    pub fn active_source(&self) -> Option<Arc<PagingSource<E>>> {
        self.active.load_full()
    }

    /// Pager whose sources come from this repository with `filter`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn pager(self: &Arc<Self>, config: PagerConfig, filter: FilterOf<E>) -> Pager<E> {
        let repository = Arc::clone(self);
        Pager::new(config, move || repository.paging_source(filter.clone()))
    }

    /// Create (no id) or update (with id) `entity`.
    pub async fn save(&self, entity: &E) -> Result<(), CoreError> {
        let request = entity.to_request()?;

        self.send(entity.id(), &request)
            .await
            .map_err(CoreError::from)
            .inspect_err(|e| {
                warn!(kind = E::KIND, id = ?entity.id(), error = %e, "save failed");
            })?;

        info!(kind = E::KIND, id = ?entity.id(), "saved");
        self.invalidate();
        Ok(())
    }

    /// Save all `entities` concurrently and invalidate once.
    ///
    /// Nothing is sent unless every record validates. On failure the
    /// first error is returned; records that did go through stay saved
    /// and the list still reloads.
    pub async fn save_all(&self, entities: &[E]) -> Result<(), CoreError> {
        let requests = entities
            .iter()
            .map(|entity| entity.to_request().map(|request| (entity.id(), request)))
            .collect::<Result<Vec<_>, _>>()?;
        if requests.is_empty() {
            return Ok(());
        }

        let results =
            future::join_all(requests.iter().map(|(id, request)| self.send(*id, request))).await;

        let saved = results.iter().filter(|result| result.is_ok()).count();
        if saved > 0 {
            self.invalidate();
        }

        match results.into_iter().find_map(Result::err) {
            Some(err) => {
                let err = CoreError::from(err);
                warn!(
                    kind = E::KIND,
                    saved,
                    total = requests.len(),
                    error = %err,
                    "batch save failed"
                );
                Err(err)
            }
            None => {
                info!(kind = E::KIND, count = saved, "saved batch");
                Ok(())
            }
        }
    }

    /// Delete all `ids` in one request. An empty set does nothing.
    pub async fn delete(&self, ids: &[EntityId]) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();

        self.client
            .delete_many::<E::Resource>(&raw)
            .await
            .map_err(CoreError::from)
            .inspect_err(|e| warn!(kind = E::KIND, ?raw, error = %e, "delete failed"))?;

        info!(kind = E::KIND, count = ids.len(), "deleted");
        self.invalidate();
        Ok(())
    }

    async fn send(
        &self,
        id: Option<EntityId>,
        request: &RequestOf<E>,
    ) -> Result<(), timetable_api::Error> {
        match id {
            Some(id) => self.client.update::<E::Resource>(id.get(), request).await,
            None => self.client.create::<E::Resource>(request).await,
        }
    }

    /// Mark the active source stale.
    pub fn invalidate(&self) {
        if let Some(source) = self.active.load_full() {
            source.invalidate();
        }
    }
}
