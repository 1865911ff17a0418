//! The Bookshelf server: a read-only GraphQL API for books and their authors.

use clap::{CommandFactory, FromArgMatches};
use std::{env, sync::Arc};

use crate::{
    args::{Args, Command},
    config::Config,
    prelude::*,
};

mod api;
mod args;
mod cmd;
mod config;
mod db;
mod http;
mod logger;
mod model;
mod prelude;
mod util;
mod version;


#[tokio::main]
async fn main() {
    let Err(e) = run().await else {
        return;
    };

    // The log might go to a file only, so the error is logged as well.
    error!("{e:?}");
    eprintln!();
    cmd::print_error(&e, 0);
    std::process::exit(1);
}

async fn run() -> Result<()> {
    // Backtraces are on unless explicitly configured otherwise.
    if env::var_os("RUST_BACKTRACE").is_none() {
        env::set_var("RUST_BACKTRACE", "1");
    }

    // The version string is only known at runtime (build info).
    let matches = Args::command().version(version::full()).get_matches();
    let args = Args::from_arg_matches(&matches)?;
    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());

    match &args.cmd {
        Command::Serve { shared } => {
            let config = load_config_and_init_logger(shared, &args)?;
            serve(config).await
        }
        Command::Db { cmd, shared } => {
            let config = load_config_and_init_logger(shared, &args)?;
            db::cmd::run(cmd, &config).await
        }
        Command::Import { args: import_args, shared } => {
            let config = load_config_and_init_logger(shared, &args)?;
            cmd::import::run(import_args, &config).await
        }
        Command::Check { shared } => cmd::check::run(shared, &args).await,
        Command::WriteConfig { target } => config::write_template(target.as_ref()),
        Command::ExportApiSchema { args } => cmd::export_api_schema::run(args),
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting Bookshelf {}", version::identifier());
    trace!("Configuration: {config:#?}");

    // Connections are established lazily, so the server can start without a
    // database. The schema is brought up to date in the background as soon
    // as the database is reachable; until then, resolvers report errors.
    let pool = db::create_pool(&config.db)?;
    tokio::spawn({
        let pool = pool.clone();
        let target = config.db.target();
        async move {
            db::connect_and_migrate_with_retry(&pool).await;
            info!("Connected to database '{target}', schema is up to date");
        }
    });

    let context = api::Context::new(Arc::new(db::PgStore::new(pool)));
    http::serve(&config, api::root_node(), context).await
        .context("HTTP server failed")
}

fn load_config_and_init_logger(shared: &args::Shared, args: &Args) -> Result<Config> {
    let (config, path) = match &shared.config {
        Some(path) => (Config::load_from(path)?, Some(path.clone())),
        None => Config::from_env_or_default_locations()?,
    };

    // The logger is configured by the config file, so nothing can be logged
    // before this point.
    logger::init(&config.log, args, args.cmd.name())?;
    match path {
        Some(path) => info!("Loaded configuration from '{}'", path.display()),
        None => info!("No configuration file found: using defaults and environment"),
    }

    Ok(config)
}
