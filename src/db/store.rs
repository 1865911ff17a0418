use std::fmt;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use postgres_types::BorrowToSql;
use tokio_postgres::Row;

use crate::{
    api::{
        Store,
        err::ApiResult,
        model::{author::Author, book::Book},
    },
    model::Key,
    prelude::*,
};
use super::util::dbargs;


/// The PostgreSQL backed [`Store`].
///
/// Each query checks out its own connection from the pool. Statements are
/// prepared once per connection and cached.
pub(crate) struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub(crate) fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn query_opt<T>(
        &self,
        query: &str,
        key: Key,
        from_row: fn(Row) -> T,
    ) -> ApiResult<Option<T>> {
        trace!("Executing SQL query: \"{}\" with {:?}", query, key);
        let conn = self.pool.get().await?;
        let statement = conn.prepare_cached(query).await?;
        let row = conn.query_opt(&statement, &[&key]).await?;
        Ok(row.map(from_row))
    }

    async fn query_all<T, P, I>(
        &self,
        query: &str,
        params: I,
        from_row: fn(Row) -> T,
    ) -> ApiResult<Vec<T>>
    where
        P: BorrowToSql,
        I: IntoIterator<Item = P> + fmt::Debug,
        I::IntoIter: ExactSizeIterator,
    {
        trace!("Executing SQL query: \"{}\" with {:?}", query, params);
        let conn = self.pool.get().await?;
        let statement = conn.prepare_cached(query).await?;
        let out = conn.query_raw(&statement, params)
            .await?
            .map_ok(from_row)
            .try_collect()
            .await?;
        Ok(out)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn book(&self, key: Key) -> ApiResult<Option<Book>> {
        let query = format!("select {} from books where id = $1", Book::COL_NAMES);
        self.query_opt(&query, key, Book::from_row).await
    }

    async fn books(&self) -> ApiResult<Vec<Book>> {
        let query = format!("select {} from books", Book::COL_NAMES);
        self.query_all(&query, dbargs![], Book::from_row).await
    }

    async fn books_by_author(&self, author: Key) -> ApiResult<Vec<Book>> {
        let query = format!("select {} from books where author_id = $1", Book::COL_NAMES);
        self.query_all(&query, dbargs![&author], Book::from_row).await
    }

    async fn author(&self, key: Key) -> ApiResult<Option<Author>> {
        let query = format!("select {} from authors where id = $1", Author::COL_NAMES);
        self.query_opt(&query, key, Author::from_row).await
    }

    async fn authors(&self) -> ApiResult<Vec<Author>> {
        let query = format!("select {} from authors", Author::COL_NAMES);
        self.query_all(&query, dbargs![], Author::from_row).await
    }
}
