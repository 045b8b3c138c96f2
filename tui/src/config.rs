//! Layered settings: built-in defaults, then the TOML config file, then
//! command-line flags (which already include their `KTOP_*` env fallbacks).

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use ktop_core::FetchErrorPolicy;
use ktop_core::Filters;
use ktop_core::KtopError;
use ktop_core::OrchestratorConfig;
use ktop_core::filter::MATCH_ALL;
use ktop_core::graph::DEFAULT_HISTORY;
use ktop_core::orchestrator::DEFAULT_INTERVAL;
use ktop_kube::KubeOptions;
use ktop_kube::NamespaceScope;
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

const APP_DIR: &str = "ktop";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid interval `{0}`: expected a positive duration such as `500ms`, `2s` or `1m`")]
    InvalidInterval(String),

    #[error("history must keep at least one sample")]
    InvalidHistory,

    #[error(transparent)]
    Filter(#[from] KtopError),
}

/// `interval` in the config file: integer milliseconds or a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IntervalValue {
    Millis(u64),
    Text(String),
}

impl IntervalValue {
    fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            IntervalValue::Millis(0) => Err(ConfigError::InvalidInterval("0".to_string())),
            IntervalValue::Millis(ms) => Ok(Duration::from_millis(*ms)),
            IntervalValue::Text(raw) => parse_interval(raw),
        }
    }
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub interval: Option<IntervalValue>,
    pub node_query: Option<String>,
    pub pod_query: Option<String>,
    pub container_query: Option<String>,
    pub namespace: Option<String>,
    pub all_namespaces: Option<bool>,
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub history: Option<usize>,
    pub keep_going: Option<bool>,
    pub log_dir: Option<PathBuf>,
}

/// Parse `<n>ms`, `<n>s` (fractions allowed) or `<n>m`.
pub fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidInterval(raw.to_string());
    let trimmed = raw.trim();

    let duration = if let Some(ms) = trimmed.strip_suffix("ms") {
        Duration::from_millis(ms.trim().parse().map_err(|_| invalid())?)
    } else if let Some(secs) = trimmed.strip_suffix('s') {
        let secs: f64 = secs.trim().parse().map_err(|_| invalid())?;
        Duration::try_from_secs_f64(secs).map_err(|_| invalid())?
    } else if let Some(mins) = trimmed.strip_suffix('m') {
        let mins: u64 = mins.trim().parse().map_err(|_| invalid())?;
        Duration::from_secs(mins.checked_mul(60).ok_or_else(invalid)?)
    } else {
        return Err(invalid());
    };

    if duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("log")
}

/// Load the config file. An explicitly named file must exist; the default
/// location is optional.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(FileConfig::default()),
        },
    };
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

/// Fully resolved settings for one session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub interval: Duration,
    pub filters: Filters,
    pub kube: KubeOptions,
    pub history: usize,
    pub policy: FetchErrorPolicy,
    pub log_dir: PathBuf,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let interval = match (cli.interval, &file.interval) {
            (Some(interval), _) => interval,
            (None, Some(value)) => value.to_duration()?,
            (None, None) => DEFAULT_INTERVAL,
        };

        let query = |flag: &Option<String>, file: Option<String>| {
            flag.clone().or(file).unwrap_or_else(|| MATCH_ALL.to_string())
        };
        let filters = Filters::new(
            &query(&cli.node_query, file.node_query),
            &query(&cli.pod_query, file.pod_query),
            &query(&cli.container_query, file.container_query),
        )?;

        let namespace = if cli.all_namespaces {
            NamespaceScope::All
        } else if let Some(namespace) = &cli.namespace {
            NamespaceScope::Named(namespace.clone())
        } else if file.all_namespaces == Some(true) {
            NamespaceScope::All
        } else if let Some(namespace) = file.namespace {
            NamespaceScope::Named(namespace)
        } else {
            NamespaceScope::ContextDefault
        };

        let history = cli.history.or(file.history).unwrap_or(DEFAULT_HISTORY);
        if history == 0 {
            return Err(ConfigError::InvalidHistory);
        }

        let policy = if cli.keep_going || file.keep_going == Some(true) {
            FetchErrorPolicy::Retain
        } else {
            FetchErrorPolicy::Exit
        };

        Ok(Self {
            interval,
            filters,
            kube: KubeOptions {
                kubeconfig: cli.kubeconfig.clone().or(file.kubeconfig),
                context: cli.context.clone().or(file.context),
                namespace,
            },
            history,
            policy,
            log_dir: cli
                .log_dir
                .clone()
                .or(file.log_dir)
                .unwrap_or_else(default_log_dir),
        })
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            interval: self.interval,
            policy: self.policy,
            filters: self.filters.clone(),
            history: self.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ktop").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn intervals() {
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_interval(" 1.5s ").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
        for bad in ["", "5", "0s", "0ms", "-1s", "fast", "1h"] {
            assert!(parse_interval(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn defaults_without_flags_or_file() {
        let settings = Settings::resolve(&cli(&[]), FileConfig::default()).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.filters.patterns(), [".*", ".*", ".*"]);
        assert_eq!(settings.kube.namespace, NamespaceScope::ContextDefault);
        assert_eq!(settings.history, DEFAULT_HISTORY);
        assert_eq!(settings.policy, FetchErrorPolicy::Exit);
    }

    #[test]
    fn file_values_fill_gaps_and_flags_win() {
        let file: FileConfig = toml::from_str(
            r#"
            interval = 3000
            node_query = "^worker"
            pod_query = "api"
            namespace = "staging"
            keep_going = true
            history = 64
            "#,
        )
        .unwrap();
        let settings = Settings::resolve(&cli(&["-N", "^infra", "-n", "prod"]), file).unwrap();
        assert_eq!(settings.interval, Duration::from_secs(3));
        assert_eq!(settings.filters.patterns(), ["^infra", "api", ".*"]);
        assert_eq!(settings.kube.namespace, NamespaceScope::Named("prod".into()));
        assert_eq!(settings.history, 64);
        assert_eq!(settings.policy, FetchErrorPolicy::Retain);
    }

    #[test]
    fn flag_namespace_beats_file_all_namespaces() {
        let file = FileConfig {
            all_namespaces: Some(true),
            ..Default::default()
        };
        let settings = Settings::resolve(&cli(&["-n", "prod"]), file.clone()).unwrap();
        assert_eq!(settings.kube.namespace, NamespaceScope::Named("prod".into()));
        let settings = Settings::resolve(&cli(&[]), file).unwrap();
        assert_eq!(settings.kube.namespace, NamespaceScope::All);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Settings::resolve(&cli(&["-P", "("]), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Filter(_)));
        assert!(err.to_string().starts_with("invalid pod filter `(`"));

        let err = Settings::resolve(&cli(&["--history", "0"]), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHistory));

        let file = FileConfig {
            interval: Some(IntervalValue::Text("soon".into())),
            ..Default::default()
        };
        assert!(matches!(
            Settings::resolve(&cli(&[]), file),
            Err(ConfigError::InvalidInterval(_))
        ));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ktop.toml");
        std::fs::write(&path, "interval = \"500ms\"\nall_namespaces = true\n").unwrap();
        let file = load_file(Some(path.as_path())).unwrap();
        assert_eq!(file.interval, Some(IntervalValue::Text("500ms".into())));
        assert_eq!(file.all_namespaces, Some(true));
    }

    #[test]
    fn missing_or_malformed_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            load_file(Some(missing.as_path())),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "refresh = 1\n").unwrap();
        assert!(matches!(load_file(Some(bad.as_path())), Err(ConfigError::Parse { .. })));
    }
}
