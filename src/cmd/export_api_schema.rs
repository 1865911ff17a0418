//! CLI command `export-api-schema` to print the GraphQL schema in SDL.

use std::{fs, path::PathBuf};

use crate::{api, prelude::*};


#[derive(Debug, clap::Args)]
pub(crate) struct Args {
    /// Target file. If not specified, the schema is written to stdout.
    target: Option<PathBuf>,
}

pub(crate) fn run(args: &Args) -> Result<()> {
    let schema = api::root_node().as_sdl();

    match &args.target {
        Some(target) => fs::write(target, schema)
            .with_context(|| format!("failed to write schema to '{}'", target.display()))?,
        None => print!("{schema}"),
    }

    Ok(())
}
