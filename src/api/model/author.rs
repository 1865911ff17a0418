use juniper::graphql_object;
use tokio_postgres::Row;

use crate::{
    api::{Context, Id, err::ApiResult, model::book::Book},
    model::Key,
};


/// A person who wrote books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Author {
    pub(crate) key: Key,
    pub(crate) name: String,
    pub(crate) age: i32,
}

#[graphql_object(Context = Context)]
impl Author {
    fn id(&self) -> Id {
        Id::author(self.key)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn age(&self) -> i32 {
        self.age
    }

    /// All books written by this author. The order is unspecified.
    ///
    /// Nullable so that a failure to load the books of one author does not
    /// null out the whole author.
    async fn book(&self, context: &Context) -> ApiResult<Option<Vec<Book>>> {
        Book::load_for_author(self.key, context).await.map(Some)
    }
}

impl Author {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        match id.key_for(Id::AUTHOR_KIND) {
            Some(key) => Self::load_by_key(key, context).await,
            None => Ok(None),
        }
    }

    pub(crate) async fn load_by_key(key: Key, context: &Context) -> ApiResult<Option<Self>> {
        context.db.author(key).await
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        context.db.authors().await
    }

    pub(crate) const COL_NAMES: &'static str = "id, name, age";

    pub(crate) fn from_row(row: Row) -> Self {
        Self {
            key: row.get(0),
            name: row.get(1),
            age: row.get(2),
        }
    }
}
