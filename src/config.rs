//! Startup and broker configuration.
//!
//! Two sources, both frozen before any I/O happens:
//! - command-line flags → [`StartupConfig`] (transport mode, port, paths,
//!   topic)
//! - a `key=value` properties file → [`BrokerConfig`], passed verbatim to the
//!   Kafka client (broker addresses, security settings, tuning)

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "JR_BRIDGE_LOG";

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 8888;

/// Default broker properties file.
pub const DEFAULT_BROKER_CONFIG: &str = "./kafka/config.properties";

/// Errors loading the broker properties file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config entry at {path}:{line}: expected key=value, got {content:?}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// Which local transport the daemon listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Unix domain stream socket (default).
    UnixSocket,
    /// Loopback TCP socket.
    Tcp,
    /// Named pipe.
    Fifo,
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "jr-kafka-bridge", about = "Forward local messages to a Kafka topic")]
struct Cli {
    /// Use TCP sockets instead of Unix domain sockets
    #[arg(short = 't', long = "tcp", conflicts_with = "fifo")]
    tcp: bool,

    /// Port number for TCP
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Use a named pipe instead of a Unix domain socket
    #[arg(short = 'f', long = "fifo")]
    fifo: bool,

    /// Directory for the FIFO/socket file
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Broker properties file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_BROKER_CONFIG)]
    config: PathBuf,

    /// Destination Kafka topic
    #[arg(value_parser = non_empty)]
    topic: String,
}

fn non_empty(value: &str) -> Result<String, String> {
    if value.is_empty() {
        Err("topic name must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

/// Validated startup configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Selected transport, fixed for the process lifetime.
    pub mode: TransportMode,
    /// TCP port (TCP mode only).
    pub port: u16,
    /// Base directory for socket/FIFO files.
    pub directory: PathBuf,
    /// Destination topic.
    pub topic: String,
    /// Path to the broker properties file.
    pub broker_config: PathBuf,
}

impl StartupConfig {
    /// Parse and validate command-line arguments, exiting with usage on
    /// stderr for invalid input.
    pub fn from_args() -> Self {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Self {
        let mode = if cli.fifo {
            TransportMode::Fifo
        } else if cli.tcp {
            TransportMode::Tcp
        } else {
            TransportMode::UnixSocket
        };

        Self {
            mode,
            port: cli.port,
            directory: cli.dir.unwrap_or_else(std::env::temp_dir),
            topic: cli.topic,
            broker_config: cli.config,
        }
    }

    /// Unix socket path for this topic.
    pub fn socket_path(&self) -> PathBuf {
        self.directory
            .join(format!("jr_kafka_{}_socket", self.topic))
    }

    /// FIFO path for this topic.
    pub fn fifo_path(&self) -> PathBuf {
        self.directory.join(format!("jr_kafka_{}_fifo", self.topic))
    }
}

/// Broker client configuration: ordered `key=value` pairs read from a
/// properties file.
#[derive(Debug, Clone, Default)]
pub struct BrokerConfig {
    pairs: Vec<(String, String)>,
}

impl BrokerConfig {
    /// Load a properties file.
    ///
    /// `#`-prefixed lines and blank lines are skipped. Keys are trimmed of
    /// trailing whitespace and values of leading whitespace. Any other line
    /// without a `=` aborts startup.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut pairs = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                ConfigError::MalformedLine {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    content: line.to_string(),
                }
            })?;

            let key = key.trim_end().to_string();
            let value = value.trim_start().to_string();
            info!(key = %key, value = %value, "Configured broker property");
            pairs.push((key, value));
        }

        Ok(Self { pairs })
    }

    /// Iterate the configured pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build a config from explicit pairs (tests, embedding).
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse_cli(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn test_default_mode_is_unix_socket() {
        let config = StartupConfig::from_cli(parse_cli(&["jr-kafka-bridge", "orders"]).unwrap());
        assert_eq!(config.mode, TransportMode::UnixSocket);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.topic, "orders");
        assert_eq!(config.directory, std::env::temp_dir());
    }

    #[test]
    fn test_tcp_and_fifo_flags() {
        let config =
            StartupConfig::from_cli(parse_cli(&["jr-kafka-bridge", "-t", "orders"]).unwrap());
        assert_eq!(config.mode, TransportMode::Tcp);

        let config =
            StartupConfig::from_cli(parse_cli(&["jr-kafka-bridge", "-f", "orders"]).unwrap());
        assert_eq!(config.mode, TransportMode::Fifo);
    }

    #[test]
    fn test_tcp_and_fifo_conflict() {
        assert!(parse_cli(&["jr-kafka-bridge", "-t", "-f", "orders"]).is_err());
    }

    #[test]
    fn test_port_out_of_range_rejected() {
        assert!(parse_cli(&["jr-kafka-bridge", "-t", "-p", "99999", "orders"]).is_err());
        assert!(parse_cli(&["jr-kafka-bridge", "-t", "-p", "0", "orders"]).is_err());
    }

    #[test]
    fn test_port_in_range_accepted() {
        let config = StartupConfig::from_cli(
            parse_cli(&["jr-kafka-bridge", "-t", "-p", "9000", "orders"]).unwrap(),
        );
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_topic_required() {
        assert!(parse_cli(&["jr-kafka-bridge"]).is_err());
        assert!(parse_cli(&["jr-kafka-bridge", ""]).is_err());
    }

    #[test]
    fn test_derived_paths() {
        let config = StartupConfig::from_cli(
            parse_cli(&["jr-kafka-bridge", "-d", "/var/run/jr", "orders"]).unwrap(),
        );
        assert_eq!(
            config.socket_path(),
            PathBuf::from("/var/run/jr/jr_kafka_orders_socket")
        );
        assert_eq!(
            config.fifo_path(),
            PathBuf::from("/var/run/jr/jr_kafka_orders_fifo")
        );
    }

    #[test]
    fn test_broker_config_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# broker connection").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "bootstrap.servers =  localhost:9092").unwrap();
        writeln!(file, "acks=all").unwrap();

        let config = BrokerConfig::load(file.path()).unwrap();
        let pairs: Vec<_> = config.iter().collect();
        assert_eq!(
            pairs,
            vec![("bootstrap.servers", "localhost:9092"), ("acks", "all")]
        );
    }

    #[test]
    fn test_broker_config_malformed_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bootstrap.servers=localhost:9092").unwrap();
        writeln!(file, "not a property").unwrap();

        let err = BrokerConfig::load(file.path()).unwrap_err();
        match err {
            ConfigError::MalformedLine { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "not a property");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_broker_config_missing_file() {
        let err = BrokerConfig::load(Path::new("/nonexistent/config.properties")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
