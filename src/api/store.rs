use async_trait::async_trait;

use crate::model::Key;
use super::{
    err::ApiResult,
    model::{author::Author, book::Book},
};


/// Read access to the two collections the API exposes.
///
/// Every method issues one independent query against the underlying storage.
/// Lookups by key return `Ok(None)` if no such record exists: absence is not
/// an error. The production implementation is [`crate::db::PgStore`].
#[async_trait]
pub(crate) trait Store: Send + Sync {
    async fn book(&self, key: Key) -> ApiResult<Option<Book>>;

    async fn books(&self) -> ApiResult<Vec<Book>>;

    /// All books whose author reference equals `author`. No particular order.
    async fn books_by_author(&self, author: Key) -> ApiResult<Vec<Book>>;

    async fn author(&self, key: Key) -> ApiResult<Option<Author>>;

    async fn authors(&self) -> ApiResult<Vec<Author>>;
}
