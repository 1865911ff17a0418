use std::{cell::Cell, sync::Arc, time::Duration};
use juniper::{graphql_value, Variables};

use crate::{
    api::{self, Store},
    cmd::import,
    model::Key,
    prelude::*,
};
use super::{retry_with_backoff, MigrationPlan};
use self::util::TestDb;

mod util;

// Lets the tests use `?` on `ApiResult` inside `anyhow::Result` functions.
impl std::fmt::Display for api::err::ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.msg)
    }
}

impl std::error::Error for api::err::ApiError {}


/// Evaluates to a `TestDb` or returns early from the test if no test database
/// server is configured.
macro_rules! test_db {
    ($ctor:ident) => {
        match TestDb::$ctor().await? {
            Some(db) => db,
            None => return Ok(()),
        }
    };
}

const LIBRARY: &str = "\
authors:
  - name: Tolkien
    age: 81
    books:
      - { name: LOTR, pages: 1200 }
      - { name: The Hobbit, pages: 310 }
  - name: Le Guin
    age: 88
    books:
      - { name: A Wizard of Earthsea, pages: 183 }
books:
  - { name: Beowulf, pages: 96 }
";

async fn import_library(db: &TestDb) -> Result<()> {
    let input: import::Input = serde_yaml::from_str(LIBRARY)?;
    let mut client = db.pool().get().await?;
    let tx = client.transaction().await?;
    assert_eq!(import::insert(&*tx, &input).await?, (2, 4));
    tx.commit().await?;
    Ok(())
}


#[tokio::test(flavor = "multi_thread")]
async fn migrating_twice_is_a_noop() -> Result<()> {
    let db = test_db!(with_migrations);
    crate::db::migrate(&mut *db.pool().get().await?).await?;

    let client = db.pool().get().await?;
    assert_eq!(MigrationPlan::build(&**client).await?, MigrationPlan::UpToDate);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn foreign_tables_block_migrations() -> Result<()> {
    let db = test_db!(new);
    let client = db.pool().get().await?;
    client.batch_execute("create table unrelated (id int)").await?;
    assert!(MigrationPlan::build(&**client).await.is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn store_reads_imported_rows() -> Result<()> {
    let db = test_db!(with_migrations);
    import_library(&db).await?;
    let store = db.store();

    let authors = store.authors().await?;
    let mut names = authors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, ["Le Guin", "Tolkien"]);
    assert_eq!(store.books().await?.len(), 4);

    let tolkien = db.key_of("authors", "Tolkien").await?;
    let author = store.author(tolkien).await?.expect("author missing");
    assert_eq!((author.key, author.name.as_str(), author.age), (tolkien, "Tolkien", 81));

    let hobbit = db.key_of("books", "The Hobbit").await?;
    let book = store.book(hobbit).await?.expect("book missing");
    assert_eq!(book.key, hobbit);
    assert_eq!(book.name, "The Hobbit");
    assert_eq!(book.pages, 310);
    assert_eq!(book.author, Some(tolkien));

    let beowulf = db.key_of("books", "Beowulf").await?;
    assert_eq!(store.book(beowulf).await?.map(|b| b.author), Some(None));

    let mut written = store.books_by_author(tolkien).await?
        .into_iter()
        .map(|b| {
            assert_eq!(b.author, Some(tolkien));
            b.name
        })
        .collect::<Vec<_>>();
    written.sort();
    assert_eq!(written, ["LOTR", "The Hobbit"]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_keys_are_none() -> Result<()> {
    let db = test_db!(with_migrations);
    import_library(&db).await?;
    let store = db.store();

    assert!(store.book(Key(123_456)).await?.is_none());
    assert!(store.author(Key(123_456)).await?.is_none());
    assert!(store.books_by_author(Key(123_456)).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn dangling_author_reference_is_stored() -> Result<()> {
    let db = test_db!(with_migrations);
    let orphan = db.pool().get().await?
        .query_one(
            "insert into books (name, pages, author_id) values ('Necronomicon', 666, 9999) \
                returning id",
            &[],
        )
        .await?
        .get::<_, Key>(0);

    let store = db.store();
    let book = store.book(orphan).await?.expect("book missing");
    assert_eq!(book.author, Some(Key(9999)));
    assert!(store.author(Key(9999)).await?.is_none());
    assert_eq!(store.books_by_author(Key(9999)).await?, vec![book]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn graphql_on_postgres() -> Result<()> {
    let db = test_db!(with_migrations);
    import_library(&db).await?;

    let id = api::Id::author(db.key_of("authors", "Le Guin").await?).to_string();
    let query = format!(
        r#"{{ author(id: "{id}") {{ name book {{ name pages author {{ name }} }} }} }}"#,
    );
    let context = api::Context::new(Arc::new(db.store()));
    let (value, errors) = juniper::execute(
        &query,
        None,
        &api::root_node(),
        &Variables::new(),
        &context,
    ).await.expect("query is invalid");

    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(value, graphql_value!({ "author": {
        "name": "Le Guin",
        "book": [{ "name": "A Wizard of Earthsea", "pages": 183, "author": { "name": "Le Guin" } }]
    } }));
    Ok(())
}


#[tokio::test]
async fn retry_until_success() {
    let attempts = Cell::new(0);
    let out = retry_with_backoff(
        "do the thing",
        Duration::from_millis(1),
        Duration::from_millis(4),
        || {
            attempts.set(attempts.get() + 1);
            let n = attempts.get();
            async move {
                if n < 4 {
                    Err(anyhow!("not yet"))
                } else {
                    Ok(n * 10)
                }
            }
        },
    ).await;

    assert_eq!(out, 40);
    assert_eq!(attempts.get(), 4);
}

#[tokio::test]
async fn no_retry_after_success() {
    let attempts = Cell::new(0);
    retry_with_backoff("succeed", Duration::from_secs(60), Duration::from_secs(60), || {
        attempts.set(attempts.get() + 1);
        async { Ok::<_, anyhow::Error>(()) }
    }).await;
    assert_eq!(attempts.get(), 1);
}
