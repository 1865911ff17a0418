//! A subcommand making sure various things are working. Useful before
//! deploying a new version: configuration, database connection and migration
//! state are checked and summarized.

use deadpool_postgres::Pool;

use crate::{
    args::{Args, Shared},
    db::{self, MigrationPlan},
    load_config_and_init_logger,
    prelude::*,
};


pub(crate) async fn run(shared: &Shared, args: &Args) -> Result<()> {
    let config = load_config_and_init_logger(shared, args)
        .context("cannot run any checks without a valid configuration")?;

    info!("Checking database connection and schema...");
    let db_pool = check_db(&config.db).await;
    let migrations = match &db_pool {
        Ok(pool) => check_migrations(pool).await,
        Err(_) => Err(anyhow!("skipped: no database connection")),
    };

    // The summary comes last so it is not buried in log output.
    let mut any_errors = false;
    println!();
    bunt::println!("{$bold+intense}Check results{/$}");
    print_outcome(&mut any_errors, "Configuration", &Ok(()));
    print_outcome(&mut any_errors, "Database connection", &db_pool);
    print_outcome(&mut any_errors, "Database migrations", &migrations);
    println!();

    if any_errors {
        bunt::println!("{$red+bold}Some checks failed.{/$}");
        std::process::exit(1);
    }

    bunt::println!("{$green+bold}All checks passed.{/$}");
    Ok(())
}

fn print_outcome<T>(any_errors: &mut bool, label: &str, result: &Result<T>) {
    match result {
        Ok(_) => bunt::println!(" ▸ {[bold+intense]}  {$green+bold}✔ ok{/$}", label),
        Err(e) => {
            *any_errors = true;
            bunt::println!(" ▸ {[bold+intense]}  {$red+bold}✘ error{/$}", label);
            super::print_error(e, 6);
            println!();
        }
    }
}

async fn check_db(config: &db::DbConfig) -> Result<Pool> {
    let pool = db::create_pool(config)?;
    db::check_connection(&pool).await
        .with_context(|| format!("could not connect to '{}'", config.target()))?;
    Ok(pool)
}

/// Builds the migration plan without executing it. Outstanding migrations are
/// fine (they are applied when the server starts), only an inconsistent
/// migration state is an error.
async fn check_migrations(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;
    let plan = MigrationPlan::build(&**client).await?;

    match plan {
        MigrationPlan::UpToDate => info!("Database schema is up to date"),
        MigrationPlan::EmptyDb => info!("Database is empty, all migrations will be applied"),
        MigrationPlan::Migrate { .. } => {
            let names = plan.pending().iter().map(|m| m.name).collect::<Vec<_>>();
            info!("Migrations {} will be applied on the next start", names.join(", "));
        }
    }

    Ok(())
}
