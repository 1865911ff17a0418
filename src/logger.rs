use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use serde::Deserialize;
use termcolor::ColorChoice;
use tracing::Level;
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    fmt::{self, time::ChronoLocal},
    prelude::*,
};

use crate::{prelude::*, args::Args};


#[derive(Debug, confique::Config)]
pub(crate) struct LogConfig {
    /// Which log messages to emit, by module path prefix and minimum level.
    /// Levels: "off", "error", "warn", "info", "debug" and "trace".
    ///
    /// For each message, the entry with the longest prefix of the message's
    /// module path decides. Messages matching no entry are dropped. Example:
    ///
    ///    [log]
    ///    filters.bookshelf = "info"
    ///    filters."bookshelf::db" = "trace"
    ///    filters."bookshelf::http" = "warn"
    ///    filters.tokio_postgres = "debug"
    #[config(default = { "bookshelf": "debug" })]
    pub(crate) filters: Filters,

    /// Additionally append log messages to this file. `${cmd}` is replaced by
    /// the subcommand name, e.g. "/var/log/bookshelf-${cmd}.log".
    pub(crate) file: Option<PathBuf>,

    /// Whether to write log messages to stdout.
    #[config(default = true)]
    pub(crate) stdout: bool,

    /// Log the headers of every incoming HTTP request (at "trace" level).
    #[config(default = false)]
    pub(crate) log_http_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub(crate) struct Filters(HashMap<String, LevelFilter>);

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;
    fn try_from(raw: HashMap<String, String>) -> Result<Self, Self::Error> {
        let mut out = HashMap::with_capacity(raw.len());
        for (prefix, level) in raw {
            out.insert(prefix, parse_level_filter(&level)?);
        }
        Ok(Self(out))
    }
}

impl Filters {
    /// The level of the longest prefix of `target`, if any.
    fn level_for(&self, target: &str) -> Option<LevelFilter> {
        self.0.iter()
            .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| *level)
    }

    fn allows(&self, target: &str, level: &Level) -> bool {
        self.level_for(target).is_some_and(|filter| level <= &filter)
    }

    fn max_level(&self) -> LevelFilter {
        self.0.values().max().copied().unwrap_or(LevelFilter::OFF)
    }
}

fn parse_level_filter(s: &str) -> Result<LevelFilter, String> {
    const LEVELS: [(&str, LevelFilter); 6] = [
        ("off", LevelFilter::OFF),
        ("error", LevelFilter::ERROR),
        ("warn", LevelFilter::WARN),
        ("info", LevelFilter::INFO),
        ("debug", LevelFilter::DEBUG),
        ("trace", LevelFilter::TRACE),
    ];

    LEVELS.iter()
        .find(|(name, _)| *name == s)
        .map(|(_, level)| *level)
        .ok_or_else(|| format!("invalid log level '{s}' (expected off, error, warn, info, debug or trace)"))
}

/// Installs the global subscriber. Must only be called once.
pub(crate) fn init(config: &LogConfig, args: &Args, cmd: &str) -> Result<()> {
    let filters = config.filters.clone();
    let max_level = filters.max_level();
    let filter = FilterFn::new(move |meta| filters.allows(meta.target(), meta.level()))
        .with_max_level_hint(max_level);

    let stdout_output = config.stdout.then(|| {
        fmt::layer()
            .with_timer(timer())
            .with_ansi(args.stdout_color() != ColorChoice::Never)
            .with_writer(std::io::stdout)
    });

    let file_output = match &config.file {
        None => None,
        Some(path) => {
            let file = open_log_file(path, cmd)?;
            Some(fmt::layer()
                .with_timer(timer())
                .with_ansi(args.color == ColorChoice::Always)
                .with_writer(Mutex::new(file)))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(stdout_output)
        .init();

    Ok(())
}

fn timer() -> ChronoLocal {
    ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".into())
}

fn open_log_file(path: &Path, cmd: &str) -> Result<File> {
    let path = path.to_str()
        .ok_or_else(|| anyhow!("log file path '{}' is not valid UTF-8", path.display()))?
        .replace("${cmd}", cmd);

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .with_context(|| format!("failed to open log file '{path}'"))?;

    // Separates the output of different runs.
    file.write_all(b"\n").context("failed to write to log file")?;

    Ok(file)
}
