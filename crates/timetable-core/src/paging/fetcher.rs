// Page fetchers: the one async seam between the pager and the backend.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use timetable_api::ApiClient;

use crate::error::ErrorKind;
use crate::model::{Entity, FilterOf};

use super::{Page, PageRequest, PageResult};

/// Loads one page. Failures come back as `Err(ErrorKind)`, never panics.
///
/// Filter values are captured at construction; changing them means
/// building a new fetcher. Any `Fn(PageRequest) -> impl Future` closure is
/// a fetcher.
pub trait PageFetcher<T>: Send + Sync + 'static {
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, PageResult<T>>;
}

impl<T, F, Fut> PageFetcher<T> for F
where
    F: Fn(PageRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PageResult<T>> + Send + 'static,
{
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, PageResult<T>> {
        Box::pin(self(request))
    }
}

/// Fetches pages of one backend collection with a fixed filter.
pub struct ResourceFetcher<E: Entity> {
    client: Arc<ApiClient>,
    filter: FilterOf<E>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> ResourceFetcher<E> {
    pub fn new(client: Arc<ApiClient>, filter: FilterOf<E>) -> Self {
        Self {
            client,
            filter,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> PageFetcher<E> for ResourceFetcher<E> {
    fn fetch(&self, request: PageRequest) -> BoxFuture<'static, PageResult<E>> {
        let client = Arc::clone(&self.client);
        let filter = self.filter.clone();

        Box::pin(async move {
            let limit = u64::try_from(request.load_size).unwrap_or(u64::MAX);
            let offset = request.offset();

            let rows = client
                .list::<E::Resource>(limit, offset, &filter)
                .await
                .map_err(|e| {
                    warn!(kind = E::KIND, offset, error = %e, "page fetch failed");
                    ErrorKind::from(&e)
                })?;

            let items = rows
                .into_iter()
                .map(E::from_response)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    warn!(kind = E::KIND, offset, error = %e, "page conversion failed");
                    ErrorKind::UnexpectedFailure
                })?;

            debug!(kind = E::KIND, offset, items = items.len(), "page fetched");
            Ok(Page::from_offset(items, request))
        })
    }
}
