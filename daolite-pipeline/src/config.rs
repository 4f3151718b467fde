// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Configuration of the `daolite` command-line tool.
//!
//! Options are taken from, in increasing order of precedence:
//!  - the defaults in [`Config::default`],
//!  - a TOML configuration file (`daolite.toml` unless `--conf-file` is
//!    given),
//!  - `DAOLITE_` prefixed environment variables (e.g. `DAOLITE_GRAPH`),
//!  - the command line.

use std::path::{Path, PathBuf};

use clap::Parser;
use daolite_engine::types::{LatencyError, LatencyResult};
use daolite_track::builder::{TrackerConfig, TrackersConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONF_FILE: &str = "daolite.toml";
pub const ENV_PREFIX: &str = "DAOLITE_";

/// Estimate the latency of an adaptive optics real-time control pipeline.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
#[command(version, about)]
pub struct Config {
    /// Pipeline description file (YAML or JSON).
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<PathBuf>,

    /// Hardware file adding to (or replacing) the built-in resources.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<PathBuf>,

    /// Resource used by components that do not name one.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_resource: Option<String>,

    /// Level of log message to display.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_level: Option<log::Level>,

    /// Regular expression selecting the entities logged at `stdout_level`.
    /// All others only log errors.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_filter_regex: Option<String>,

    /// Write log messages to this file instead of stdout.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,

    /// Write the report to this file as YAML.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Print the start and finish of every group.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<bool>,

    /// Configuration file.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conf_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph: None,
            hardware: None,
            default_resource: None,
            stdout_level: Some(log::Level::Warn),
            stdout_filter_regex: Some(String::new()),
            log_file: None,
            output: None,
            details: Some(false),
            conf_file: None,
        }
    }
}

impl Config {
    /// Merge all sources, with `cli` being the parsed command line.
    pub fn from_sources(cli: Config) -> LatencyResult<Config> {
        let conf_file = match &cli.conf_file {
            Some(conf_file) => {
                if !conf_file.exists() {
                    return Err(LatencyError::Parse(format!(
                        "Unable to read {}",
                        conf_file.display()
                    )));
                }
                conf_file.clone()
            }
            None => PathBuf::from(DEFAULT_CONF_FILE),
        };
        Ok(Self::figment_to_config(&conf_file)?.clap_merge(cli))
    }

    /// The defaults overridden by `conf_file` (if it exists) and then by
    /// the environment.
    pub fn figment_to_config(conf_file: &Path) -> LatencyResult<Config> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(conf_file))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| LatencyError::Parse(format!("Invalid configuration: {e}")))
    }

    /// Override any option given on the command line.
    #[must_use]
    pub fn clap_merge(self, cli: Config) -> Config {
        Config {
            graph: cli.graph.or(self.graph),
            hardware: cli.hardware.or(self.hardware),
            default_resource: cli.default_resource.or(self.default_resource),
            stdout_level: cli.stdout_level.or(self.stdout_level),
            stdout_filter_regex: cli.stdout_filter_regex.or(self.stdout_filter_regex),
            log_file: cli.log_file.or(self.log_file),
            output: cli.output.or(self.output),
            details: cli.details.or(self.details),
            conf_file: cli.conf_file.or(self.conf_file),
        }
    }

    #[must_use]
    pub fn details(&self) -> bool {
        self.details.unwrap_or(false)
    }

    /// Log to the log file if one is configured, otherwise to stdout.
    #[must_use]
    pub fn trackers_config(&self) -> TrackersConfig<'_> {
        let level = self.stdout_level.unwrap_or(log::Level::Warn);
        let filter_regex = self.stdout_filter_regex.as_deref().unwrap_or("");
        TrackersConfig {
            stdout: TrackerConfig {
                enable: self.log_file.is_none(),
                level,
                filter_regex,
                file: None,
            },
            log_file: TrackerConfig {
                enable: self.log_file.is_some(),
                level,
                filter_regex,
                file: self.log_file.as_deref(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    fn conf_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn defaults_without_a_file() {
        let config = Config::figment_to_config(Path::new("no-such-daolite.toml")).unwrap();
        assert_eq!(config.stdout_level, Some(log::Level::Warn));
        assert_eq!(config.stdout_filter_regex.as_deref(), Some(""));
        assert!(!config.details());
        assert!(config.graph.is_none());
    }

    #[test]
    #[serial]
    fn file_overrides_defaults() {
        let file = conf_file("graph = \"scao.yaml\"\nstdout_level = \"debug\"\ndetails = true\n");
        let config = Config::figment_to_config(file.path()).unwrap();
        assert_eq!(config.graph, Some(PathBuf::from("scao.yaml")));
        assert_eq!(config.stdout_level, Some(log::Level::Debug));
        assert!(config.details());
    }

    #[test]
    #[serial]
    fn command_line_overrides_file() {
        let file = conf_file("graph = \"scao.yaml\"\noutput = \"report.yaml\"\n");
        let cli = Config::try_parse_from([
            "daolite",
            "--graph",
            "mcao.yaml",
            "--details",
            "--conf-file",
            file.path().to_str().unwrap(),
        ])
        .unwrap();
        let config = Config::from_sources(cli).unwrap();
        assert_eq!(config.graph, Some(PathBuf::from("mcao.yaml")));
        assert_eq!(config.output, Some(PathBuf::from("report.yaml")));
        assert!(config.details());
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let file = conf_file("default_resource = \"amd_epyc_7763\"\n");
        // SAFETY: tests touching the environment are serialised.
        unsafe { std::env::set_var("DAOLITE_DEFAULT_RESOURCE", "nvidia_a100_80gb") };
        let config = Config::figment_to_config(file.path());
        unsafe { std::env::remove_var("DAOLITE_DEFAULT_RESOURCE") };

        assert_eq!(
            config.unwrap().default_resource.as_deref(),
            Some("nvidia_a100_80gb")
        );
    }

    #[test]
    #[serial]
    fn missing_conf_file_given_explicitly() {
        let cli = Config::try_parse_from(["daolite", "--conf-file", "no-such-daolite.toml"]).unwrap();
        let err = Config::from_sources(cli).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Parse failed: Unable to read no-such-daolite.toml"
        );
    }

    #[test]
    fn log_file_replaces_stdout() {
        let config = Config {
            log_file: Some("daolite.log".to_string()),
            ..Config::default()
        };
        let trackers = config.trackers_config();
        assert!(!trackers.stdout.enable);
        assert!(trackers.log_file.enable);
        assert_eq!(trackers.log_file.file, Some("daolite.log"));
    }
}
