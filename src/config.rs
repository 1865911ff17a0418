use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use confique::Config as _;

use crate::prelude::*;


/// The locations where we look for a configuration file. The first existing
/// file in this list is used.
const DEFAULT_PATHS: &[&str] = &["config.toml", "/etc/bookshelf/config.toml"];

const CONFIG_PATH_ENV: &str = "BOOKSHELF_CONFIG_PATH";

/// Configuration for the Bookshelf server.
///
/// All relative paths are relative to the location of this configuration file.
/// Some values can also be set via environment variables, which take
/// precedence over the file.
#[derive(Debug, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) db: crate::db::DbConfig,

    #[config(nested)]
    pub(crate) http: crate::http::HttpConfig,

    #[config(nested)]
    pub(crate) log: crate::logger::LogConfig,
}

impl Config {
    /// Tries to find a config file by checking `BOOKSHELF_CONFIG_PATH` and
    /// a list of default locations. The first config file is loaded via
    /// [`Self::load_from`]. If no file exists at all, the configuration is
    /// built from defaults and environment variables only. Returns the
    /// loaded config and the path it was loaded from (if any).
    pub(crate) fn from_env_or_default_locations() -> Result<(Self, Option<PathBuf>)> {
        let path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => DEFAULT_PATHS.iter().map(PathBuf::from).find(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let config = Self::load_from(&path)
                    .with_context(|| format!("failed to load configuration from '{}'", path.display()))?;
                Ok((config, Some(path)))
            }
            None => {
                let config = Config::builder()
                    .env()
                    .load()
                    .context("failed to load configuration from environment")?;
                Ok((config, None))
            }
        }
    }

    /// Loads the configuration from a specific TOML file. Environment
    /// variables override values from the file.
    pub(crate) fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Config::builder()
            .env()
            .file(path)
            .load()
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;

        config.fix_paths(path)?;

        Ok(config)
    }

    /// Goes through all paths in the configuration and changes relative paths
    /// to be absolute based on the path of the configuration file itself.
    fn fix_paths(&mut self, config_path: &Path) -> Result<()> {
        let absolute_config_path = config_path.canonicalize()
            .context("failed to canonicalize config path")?;
        let base = absolute_config_path.parent()
            .ok_or_else(|| anyhow!("config file path has no parent"))?;

        if let Some(p) = &mut self.log.file {
            if p.is_relative() {
                *p = base.join(&p);
            }
        }

        Ok(())
    }
}

/// Writes the generated TOML config template file to the given destination or
/// stdout.
pub(crate) fn write_template(path: Option<&PathBuf>) -> Result<()> {
    info!(
        "Writing configuration template to '{}'",
        path.map(|p| p.display().to_string()).unwrap_or("<stdout>".into()),
    );

    let template = template();
    match path {
        Some(path) => fs::write(path, template)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => io::stdout().write_all(template.as_bytes())?,
    }

    Ok(())
}

fn template() -> String {
    use confique::toml::FormatOptions;

    let mut options = FormatOptions::default();
    options.general.nested_field_gap = 2;
    confique::toml::template::<Config>(options)
}


#[cfg(test)]
mod tests {
    use std::fs;
    use super::{template, Config};

    #[test]
    fn template_lists_all_sections() {
        let template = template();
        for needle in ["[db]", "[http]", "[log]", "max_connections", "graphiql", "filters"] {
            assert!(template.contains(needle), "template misses '{needle}'");
        }
    }

    #[test]
    fn relative_log_file_is_resolved_against_config_dir() {
        let dir = std::env::temp_dir().join(format!("bookshelf-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[log]\nfile = \"logs/${cmd}.log\"\nstdout = false\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        let file = config.log.file.unwrap();
        assert!(file.is_absolute());
        assert!(file.ends_with("logs/${cmd}.log"));
        assert!(!config.log.stdout);
        assert!(config.http.graphiql);

        fs::remove_dir_all(&dir).unwrap();
    }
}
