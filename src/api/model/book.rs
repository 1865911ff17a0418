use juniper::graphql_object;
use tokio_postgres::Row;

use crate::{
    api::{Context, Id, err::ApiResult, model::author::Author},
    model::Key,
};


/// A book. Each book optionally references its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Book {
    pub(crate) key: Key,
    pub(crate) name: String,
    pub(crate) pages: i32,

    /// Key of the author. This is not checked against the `authors` table,
    /// so it might refer to an author that does not exist.
    pub(crate) author: Option<Key>,
}

#[graphql_object(Context = Context)]
impl Book {
    fn id(&self) -> Id {
        Id::book(self.key)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pages(&self) -> i32 {
        self.pages
    }

    /// The author of this book, or `null` if the book has no author or refers
    /// to an author that does not exist.
    async fn author(&self, context: &Context) -> ApiResult<Option<Author>> {
        match self.author {
            Some(key) => Author::load_by_key(key, context).await,
            None => Ok(None),
        }
    }
}

impl Book {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        match id.key_for(Id::BOOK_KIND) {
            Some(key) => context.db.book(key).await,
            None => Ok(None),
        }
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        context.db.books().await
    }

    pub(crate) async fn load_for_author(author: Key, context: &Context) -> ApiResult<Vec<Self>> {
        context.db.books_by_author(author).await
    }

    pub(crate) const COL_NAMES: &'static str = "id, name, pages, author_id";

    pub(crate) fn from_row(row: Row) -> Self {
        Self {
            key: row.get(0),
            name: row.get(1),
            pages: row.get(2),
            author: row.get(3),
        }
    }
}
