//! This module defines the command line arguments the application accepts.

use std::{io::IsTerminal, path::PathBuf};
use termcolor::ColorChoice;

use crate::{cmd, db::cmd::DbCommand};


#[derive(Debug, clap::Parser)]
#[clap(about = "GraphQL API for books and their authors.")]
pub(crate) struct Args {
    /// Whether to use colors in the output: `auto`, `always` or `never`.
    #[clap(long, global = true, default_value = "auto", value_parser = parse_color_choice)]
    pub(crate) color: ColorChoice,

    #[clap(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Starts the HTTP server serving the GraphQL API.
    Serve {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Database operations.
    Db {
        #[clap(subcommand)]
        cmd: DbCommand,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Inserts authors and books from a YAML file into the database.
    Import {
        #[clap(flatten)]
        args: cmd::import::Args,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Checks config, DB connection and the migration state.
    ///
    /// Exits with 0 if everything is Ok, and with 1 otherwise.
    Check {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Outputs a template for the configuration file (which includes
    /// descriptions or all options).
    WriteConfig {
        /// Target file. If not specified, the template is written to stdout.
        target: Option<PathBuf>,
    },

    /// Exports the API as GraphQL schema.
    ExportApiSchema {
        #[clap(flatten)]
        args: cmd::export_api_schema::Args,
    },
}

impl Command {
    /// Short name used for the `${cmd}` placeholder of the log file path.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Serve { .. } => "serve",
            Command::Db { .. } => "db",
            Command::Import { .. } => "import",
            Command::Check { .. } => "check",
            Command::WriteConfig { .. } => "write-config",
            Command::ExportApiSchema { .. } => "export-api-schema",
        }
    }
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, the
    /// `BOOKSHELF_CONFIG_PATH` env variable, `config.toml` and
    /// `/etc/bookshelf/config.toml` are tried in that order.
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
}

impl Args {
    pub(crate) fn stdout_color(&self) -> ColorChoice {
        resolve_auto(self.color, std::io::stdout().is_terminal())
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        resolve_auto(self.color, std::io::stderr().is_terminal())
    }
}

fn resolve_auto(choice: ColorChoice, is_terminal: bool) -> ColorChoice {
    match choice {
        ColorChoice::Auto if !is_terminal => ColorChoice::Never,
        other => other,
    }
}

fn parse_color_choice(s: &str) -> Result<ColorChoice, String> {
    match s {
        "auto" => Ok(ColorChoice::Auto),
        "always" => Ok(ColorChoice::Always),
        "never" => Ok(ColorChoice::Never),
        other => Err(format!("invalid color choice '{other}' (expected auto, always or never)")),
    }
}


#[cfg(test)]
mod tests {
    use clap::Parser;
    use termcolor::ColorChoice;
    use super::{Args, Command};

    #[test]
    fn color_flag() {
        let args = Args::try_parse_from(["bookshelf", "--color", "never", "check"]).unwrap();
        assert_eq!(args.color, ColorChoice::Never);
        assert!(matches!(args.cmd, Command::Check { .. }));

        let args = Args::try_parse_from(["bookshelf", "serve"]).unwrap();
        assert_eq!(args.color, ColorChoice::Auto);

        assert!(Args::try_parse_from(["bookshelf", "--color", "pink", "serve"]).is_err());
    }

    #[test]
    fn shared_config_path() {
        let args = Args::try_parse_from(["bookshelf", "db", "-c", "x.toml", "migrate"]).unwrap();
        match args.cmd {
            Command::Db { shared, .. } => {
                assert_eq!(shared.config.as_deref(), Some("x.toml".as_ref()));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn debug_asserts() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
