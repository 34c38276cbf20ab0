use async_trait::async_trait;

use crate::error::StoreError;
use crate::object::ParseObject;
use crate::query::Query;

/// Page size used by [`ObjectStore::find_all`].
pub const PAGE_SIZE: usize = 1000;

/// Master-key access to the hosted object store.
///
/// Adapters implement single-page `find`, `get` and `save`; full scans
/// are built on top of `find`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// One page of results, honouring `query.limit` / `query.skip`.
    async fn find(&self, query: &Query) -> Result<Vec<ParseObject>, StoreError>;

    async fn get(&self, class_name: &str, object_id: &str) -> Result<ParseObject, StoreError>;

    /// Create (no `object_id`) or update the object, applying pending ops.
    ///
    /// Returns the object as stored, with ops cleared.
    async fn save(&self, object: &ParseObject) -> Result<ParseObject, StoreError>;

    /// Every matching object, paging through the store.
    async fn find_all(&self, query: &Query) -> Result<Vec<ParseObject>, StoreError> {
        let mut base = query.clone();
        if base.order.is_none() {
            base = base.order("objectId");
        }

        let mut out = Vec::new();
        let mut skip = query.skip;
        loop {
            let page = self.find(&base.clone().limit(PAGE_SIZE).skip(skip)).await?;
            let len = page.len();
            out.extend(page);
            if len < PAGE_SIZE {
                break;
            }
            skip += len;
        }
        Ok(out)
    }
}
