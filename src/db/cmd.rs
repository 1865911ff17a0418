use crate::{prelude::*, config::Config};
use super::{create_pool, migrations::{MigrationPlan, MIGRATIONS}, Db};


#[derive(Debug, clap::Subcommand)]
pub(crate) enum DbCommand {
    /// Applies all outstanding migrations. The server does this on startup as
    /// well.
    Migrate,

    /// Lists all migrations this version knows and whether they are applied.
    Status,
}

/// Entry point for `db` commands.
pub(crate) async fn run(cmd: &DbCommand, config: &Config) -> Result<()> {
    let pool = create_pool(&config.db)?;
    let mut client = pool.get().await
        .with_context(|| format!("failed to connect to '{}'", config.db.target()))?;

    match cmd {
        DbCommand::Migrate => super::migrate(&mut client).await?,
        DbCommand::Status => {
            bunt::println!("{$bold}Database:{/$} {}", config.db.target());
            status(&client).await?;
        }
    }

    Ok(())
}

async fn status(db: &Db) -> Result<()> {
    let plan = MigrationPlan::build(&**db).await?;
    let pending = plan.pending();

    for migration in MIGRATIONS {
        if pending.iter().any(|p| p.id == migration.id) {
            bunt::println!("  {$yellow}○ pending{/$}  {}", migration.name);
        } else {
            bunt::println!("  {$green}✔ applied{/$}  {}", migration.name);
        }
    }

    if !pending.is_empty() {
        println!();
        println!("Run `db migrate` or start the server to apply pending migrations.");
    }

    Ok(())
}
