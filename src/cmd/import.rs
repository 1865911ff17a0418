//! CLI command `import` to read authors and books from a YAML file and store
//! them in the DB. Example input:
//!
//! ```yaml
//! authors:
//!   - name: J. R. R. Tolkien
//!     age: 81
//!     books:
//!       - { name: The Lord of the Rings, pages: 1200 }
//! books:
//!   - { name: Beowulf, pages: 96 }
//! ```

use serde::Deserialize;
use std::{fs::File, path::PathBuf};
use tokio_postgres::GenericClient;

use crate::{
    config::Config,
    db,
    model::Key,
    prelude::*,
};


#[derive(Debug, clap::Args)]
pub(crate) struct Args {
    /// YAML file containing authors and books.
    input_file: PathBuf,
}


#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Input {
    #[serde(default)]
    authors: Vec<Author>,

    /// Books without any author.
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Author {
    name: String,
    age: i32,

    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Book {
    name: String,
    pages: i32,
}


pub(crate) async fn run(args: &Args, config: &Config) -> Result<()> {
    let file = File::open(&args.input_file)
        .with_context(|| format!("failed to open '{}'", args.input_file.display()))?;
    let input: Input = serde_yaml::from_reader(file)
        .context("failed to parse YAML input")?;
    info!("Read YAML file");

    // Open DB connection, check consistency and migrate if necessary.
    let pool = db::create_pool(&config.db)?;
    db::connect_and_migrate(&pool).await?;
    let mut client = pool.get().await?;

    info!("Starting to insert authors and books into the DB...");
    let tx = client.transaction().await?;
    let (num_authors, num_books) = insert(&*tx, &input).await?;
    tx.commit().await?;
    info!("Done inserting {num_authors} authors and {num_books} books");

    Ok(())
}

/// Inserts everything from `input`, returning the number of authors and books
/// inserted.
pub(crate) async fn insert(db: &impl GenericClient, input: &Input) -> Result<(usize, usize)> {
    let mut num_books = 0;
    for author in &input.authors {
        let key = insert_author(db, author).await?;
        for book in &author.books {
            insert_book(db, book, Some(key)).await?;
        }
        num_books += author.books.len();
    }
    for book in &input.books {
        insert_book(db, book, None).await?;
    }
    num_books += input.books.len();

    Ok((input.authors.len(), num_books))
}

async fn insert_author(db: &impl GenericClient, author: &Author) -> Result<Key> {
    let row = db
        .query_one(
            "insert into authors (name, age) values ($1, $2) returning id",
            &[&author.name, &author.age],
        )
        .await
        .with_context(|| format!("failed to insert author '{}'", author.name))?;

    let key = row.get::<_, Key>(0);
    debug!("Inserted author '{}' as {key:?}", author.name);
    Ok(key)
}

async fn insert_book(db: &impl GenericClient, book: &Book, author: Option<Key>) -> Result<()> {
    db
        .execute(
            "insert into books (name, pages, author_id) values ($1, $2, $3)",
            &[&book.name, &book.pages, &author],
        )
        .await
        .with_context(|| format!("failed to insert book '{}'", book.name))?;

    debug!("Inserted book '{}'", book.name);
    Ok(())
}
