use std::sync::atomic::{AtomicU32, Ordering};
use deadpool_postgres::{Manager, ManagerConfig, Pool};
use tokio_postgres::{Client, NoTls};

use crate::{prelude::*, db::PgStore, model::Key};


/// Connection string of a PostgreSQL server on which the tests may create and
/// drop databases. Database tests are skipped if this is not set.
const URL_ENV: &str = "BOOKSHELF_TEST_DATABASE_URL";

/// A temporary database used for a single test. It is dropped on drop.
///
/// Only use it with the multi threaded Tokio runtime, otherwise `drop` hangs.
pub(super) struct TestDb {
    pool: Option<Pool>,
    controller: Client,
    name: String,
}

impl TestDb {
    /// Creates a fresh, empty database. Returns `None` if no test server is
    /// configured.
    pub(super) async fn new() -> Result<Option<Self>> {
        let Ok(url) = std::env::var(URL_ENV) else {
            eprintln!("`{URL_ENV}` is not set: skipping database test");
            return Ok(None);
        };

        let (controller, connection) = tokio_postgres::connect(&url, NoTls).await
            .context("could not connect to test database server")?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                panic!("PG connection error: {e}");
            }
        });

        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let name = format!(
            "bookshelf_test_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed),
        );
        controller.execute(&format!("create database {name}"), &[]).await
            .context("failed to create temporary test DB")?;

        let mut pg_config = url.parse::<tokio_postgres::Config>()?;
        pg_config.dbname(&name);
        let manager = Manager::from_config(pg_config, NoTls, ManagerConfig::default());
        let pool = Pool::builder(manager).max_size(4).build()?;

        Ok(Some(Self { pool: Some(pool), controller, name }))
    }

    pub(super) async fn with_migrations() -> Result<Option<Self>> {
        let Some(db) = Self::new().await? else {
            return Ok(None);
        };
        crate::db::migrate(&mut *db.pool().get().await?).await
            .context("failed to run migrations on test DB")?;
        Ok(Some(db))
    }

    pub(super) fn pool(&self) -> &Pool {
        self.pool.as_ref().expect("pool already closed")
    }

    pub(super) fn store(&self) -> PgStore {
        PgStore::new(self.pool().clone())
    }

    /// Returns the key of the row in `table` with the given name.
    pub(super) async fn key_of(&self, table: &str, name: &str) -> Result<Key> {
        let row = self.pool().get().await?
            .query_one(&format!("select id from {table} where name = $1"), &[&name])
            .await?;
        Ok(row.get(0))
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        // All connections to the temporary database have to be gone before
        // it can be dropped. There is no async drop, so we block.
        if let Some(pool) = self.pool.take() {
            pool.close();
        }
        let result = futures::executor::block_on(
            self.controller.execute(&format!("drop database {} with (force)", self.name), &[]),
        );
        if let Err(e) = result {
            eprintln!("failed to drop temporary test DB '{}': {e}", self.name);
        }
    }
}
