use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::parse_interval;

/// Command-line flags. Every flag also reads a `KTOP_*` environment variable
/// and, when neither is given, falls back to the config file and then to the
/// built-in default.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "ktop", version, about = "Kubernetes monitoring dashboard on terminal")]
pub struct Cli {
    /// Refresh interval, e.g. `500ms`, `2s` or `1m` [default: 1s].
    #[arg(long, short = 'i', env = "KTOP_INTERVAL", value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Only show nodes whose name matches this regex [default: .*].
    #[arg(long = "node-query", short = 'N', env = "KTOP_NODE_QUERY", value_name = "REGEX")]
    pub node_query: Option<String>,

    /// Only show pods whose name matches this regex [default: .*].
    #[arg(long = "pod-query", short = 'P', env = "KTOP_POD_QUERY", value_name = "REGEX")]
    pub pod_query: Option<String>,

    /// Only show containers whose name matches this regex [default: .*].
    #[arg(long = "container-query", short = 'C', env = "KTOP_CONTAINER_QUERY", value_name = "REGEX")]
    pub container_query: Option<String>,

    /// Namespace to list pods in [default: the context's namespace].
    #[arg(long, short = 'n', env = "KTOP_NAMESPACE", conflicts_with = "all_namespaces")]
    pub namespace: Option<String>,

    /// List pods across all namespaces.
    #[arg(long = "all-namespaces", short = 'A', env = "KTOP_ALL_NAMESPACES")]
    pub all_namespaces: bool,

    /// Kubeconfig context to use.
    #[arg(long, env = "KTOP_CONTEXT")]
    pub context: Option<String>,

    /// Path to a kubeconfig file.
    #[arg(long, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Number of samples kept for the usage graphs [default: 256].
    #[arg(long, env = "KTOP_HISTORY", value_name = "SAMPLES")]
    pub history: Option<usize>,

    /// Keep the last snapshot on screen when a refresh fails instead of
    /// exiting.
    #[arg(long = "keep-going", env = "KTOP_KEEP_GOING")]
    pub keep_going: bool,

    /// Config file [default: <config dir>/ktop/config.toml].
    #[arg(long, env = "KTOP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for log files [default: <data dir>/ktop/log].
    #[arg(long = "log-dir", env = "KTOP_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_flags_match_long_ones() {
        let cli = Cli::try_parse_from([
            "ktop", "-i", "500ms", "-N", "^worker", "-P", "api", "-C", "^app$", "-n", "prod",
        ])
        .unwrap();
        assert_eq!(cli.interval, Some(Duration::from_millis(500)));
        assert_eq!(cli.node_query.as_deref(), Some("^worker"));
        assert_eq!(cli.pod_query.as_deref(), Some("api"));
        assert_eq!(cli.container_query.as_deref(), Some("^app$"));
        assert_eq!(cli.namespace.as_deref(), Some("prod"));
        assert!(!cli.all_namespaces);
    }

    #[test]
    fn namespace_conflicts_with_all_namespaces() {
        assert!(Cli::try_parse_from(["ktop", "-n", "prod", "-A"]).is_err());
    }

    #[test]
    fn malformed_interval_is_rejected() {
        assert!(Cli::try_parse_from(["ktop", "--interval", "soon"]).is_err());
    }
}
