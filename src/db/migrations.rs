use std::num::NonZeroUsize;
use tokio_postgres::GenericClient;

use crate::prelude::*;
use super::Db;


/// A schema change shipped with this binary. Migrations are applied strictly
/// in order and never modified once released.
#[derive(Debug)]
pub(crate) struct Migration {
    pub(crate) id: i64,
    pub(crate) name: &'static str,
    script: &'static str,
}

macro_rules! migration {
    ($id:literal, $name:literal) => {
        Migration {
            id: $id,
            name: $name,
            script: include_str!(concat!("migrations/", $name, ".sql")),
        }
    };
}

pub(crate) static MIGRATIONS: &[Migration] = &[
    migration!(1, "01-authors"),
    migration!(2, "02-books"),
];

/// Arbitrary but fixed key for the advisory lock held while migrating.
const MIGRATION_LOCK: i64 = 0x626f6f6b;


/// What needs to happen to bring the database schema up to date.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum MigrationPlan {
    /// No tables at all: the meta table is created and every migration applied.
    EmptyDb,

    UpToDate,

    /// The last `new_migrations` known migrations are not yet applied.
    Migrate {
        new_migrations: NonZeroUsize,
    },
}

/// A row of `__db_migrations`.
#[derive(Debug)]
struct AppliedMigration {
    id: i64,
    name: String,
    applied_on: String,
    script: String,
}

impl MigrationPlan {
    /// Inspects the database and decides what to do. Fails if the applied
    /// migrations do not form a prefix of [`MIGRATIONS`]. Read only.
    pub(crate) async fn build(db: &impl GenericClient) -> Result<Self> {
        let row = db
            .query_one(
                "select
                    to_regclass('public.__db_migrations') is not null,
                    (select string_agg(table_name::text, ', ')
                        from information_schema.tables
                        where table_schema = 'public' and table_type = 'BASE TABLE')",
                &[],
            )
            .await
            .context("failed to inspect database tables")?;

        if !row.get::<_, bool>(0) {
            if let Some(tables) = row.get::<_, Option<String>>(1) {
                bail!(
                    "the database has no '__db_migrations' table but contains other tables \
                        ({tables}). Refusing to touch a database not managed by Bookshelf.",
                );
            }
            return Ok(Self::EmptyDb);
        }

        let applied = db
            .query(
                "select id, name, applied_on::text, script from __db_migrations order by id",
                &[],
            )
            .await
            .context("failed to read '__db_migrations'")?
            .into_iter()
            .map(|row| AppliedMigration {
                id: row.get(0),
                name: row.get(1),
                applied_on: row.get(2),
                script: row.get(3),
            })
            .collect::<Vec<_>>();

        Self::compare(&applied, MIGRATIONS)
    }

    fn compare(applied: &[AppliedMigration], known: &[Migration]) -> Result<Self> {
        for (pos, applied) in applied.iter().enumerate() {
            let Some(expected) = known.get(pos) else {
                bail!(
                    "migration {} ('{}', applied on {}) is unknown to this version. Was the \
                        database migrated by a newer release?",
                    applied.id,
                    applied.name,
                    applied.applied_on,
                );
            };

            if applied.id != expected.id {
                bail!(
                    "expected migration {} ('{}') as number {} in '__db_migrations', \
                        but found {} ('{}')",
                    expected.id,
                    expected.name,
                    pos + 1,
                    applied.id,
                    applied.name,
                );
            }

            if applied.script != expected.script {
                debug!("Script of '{}' in this binary:\n{}", expected.name, expected.script);
                debug!("Script of '{}' in the database:\n{}", applied.name, applied.script);
                bail!(
                    "migration '{}' (applied on {}) differs from the script in this binary",
                    expected.name,
                    applied.applied_on,
                );
            }
        }

        Ok(match NonZeroUsize::new(known.len() - applied.len()) {
            None => Self::UpToDate,
            Some(new_migrations) => Self::Migrate { new_migrations },
        })
    }

    /// The migrations this plan would apply, in order.
    pub(crate) fn pending(&self) -> &'static [Migration] {
        match self {
            Self::EmptyDb => MIGRATIONS,
            Self::UpToDate => &[],
            Self::Migrate { new_migrations } => {
                &MIGRATIONS[MIGRATIONS.len() - new_migrations.get()..]
            }
        }
    }

    async fn apply(&self, db: &impl GenericClient) -> Result<()> {
        if *self == Self::EmptyDb {
            info!("Database is empty, creating '__db_migrations'");
            db.batch_execute(include_str!("db-migrations.sql"))
                .await
                .context("failed to create '__db_migrations'")?;
        }

        let pending = self.pending();
        if pending.is_empty() {
            debug!("Database schema is up to date");
            return Ok(());
        }

        for migration in pending {
            info!("Applying migration '{}'", migration.name);
            trace!("Migration script:\n{}", migration.script);

            db.batch_execute(migration.script)
                .await
                .with_context(|| format!("migration '{}' failed", migration.name))?;
            db.execute(
                "insert into __db_migrations (id, name, applied_on, script) \
                    values ($1, $2, now() at time zone 'utc', $3)",
                &[&migration.id, &migration.name, &migration.script],
            )
                .await
                .context("failed to record migration in '__db_migrations'")?;
        }
        info!("Applied {} migration(s)", pending.len());

        Ok(())
    }
}

/// Brings the schema up to date, all in one transaction. Concurrent callers
/// (e.g. several server processes starting at once) queue up on an advisory
/// lock, so the later ones find the schema already migrated.
pub(crate) async fn migrate(db: &mut Db) -> Result<()> {
    let tx = db.transaction().await?;
    tx.execute("select pg_advisory_xact_lock($1)", &[&MIGRATION_LOCK])
        .await
        .context("failed to acquire migration lock")?;

    let plan = MigrationPlan::build(&*tx).await?;
    plan.apply(&*tx).await?;
    tx.commit().await.context("failed to commit migrations")?;

    Ok(())
}
