use juniper::graphql_object;

use super::{
    Context,
    Id,
    err::ApiResult,
    model::{author::Author, book::Book},
};


/// The root query object.
pub(crate) struct Query;

#[graphql_object(name = "RootQueryType", Context = Context)]
impl Query {
    /// Returns the book with the given ID or `null` if the ID does not refer
    /// to a book.
    async fn book(id: Option<Id>, context: &Context) -> ApiResult<Option<Book>> {
        match id {
            Some(id) => Book::load_by_id(id, context).await,
            None => Ok(None),
        }
    }

    /// Returns all books. This is `null` only if loading them failed, in
    /// which case `errors` says why.
    async fn books(context: &Context) -> ApiResult<Option<Vec<Book>>> {
        Book::load_all(context).await.map(Some)
    }

    /// Returns the author with the given ID or `null` if the ID does not
    /// refer to an author.
    async fn author(id: Option<Id>, context: &Context) -> ApiResult<Option<Author>> {
        match id {
            Some(id) => Author::load_by_id(id, context).await,
            None => Ok(None),
        }
    }

    /// Returns all authors. Like `books`, this is `null` only on failure.
    async fn authors(context: &Context) -> ApiResult<Option<Vec<Author>>> {
        Author::load_all(context).await.map(Some)
    }
}
