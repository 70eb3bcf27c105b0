use crate::{
    cases::IndexCase,
    database::{util::is_identifier, Dialect},
};
use clap::{Parser, ValueEnum};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to open config file {path:?}: {source}")]
    FileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config file is invalid: {0}")]
    InvalidConfig(#[from] serde_yaml::Error),
}

/// Benchmark index effectiveness on a customers/orders schema.
///
/// Without arguments the fixed benchmark sequence runs against the MySQL
/// database configured through the environment.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// YAML file with volumes, index cases and connection settings
    #[arg(short, long, env = "BENCH_CONFIG")]
    pub config: Option<PathBuf>,
    #[arg(long, env = "DB_BACKEND", value_enum)]
    pub backend: Option<Backend>,
    #[arg(long, env = "DB_HOST")]
    pub host: Option<String>,
    #[arg(long, env = "DB_PORT")]
    pub port: Option<u16>,
    #[arg(long, env = "DB_USER")]
    pub user: Option<String>,
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, env = "DB_NAME")]
    pub database: Option<String>,
    /// Database file, only used by the sqlite backend
    #[arg(long, env = "DB_PATH")]
    pub path: Option<PathBuf>,
    /// Timed executions per query and index state, the first one is excluded from the mean
    #[arg(long, env = "BENCH_RUNS")]
    pub runs: Option<usize>,
    /// Seed for the synthetic data, random if unset
    #[arg(long, env = "BENCH_SEED")]
    pub seed: Option<u64>,
    /// Root directory for plans, timings and charts
    #[arg(long, env = "BENCH_OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Mysql,
    Sqlite,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    #[serde(default, alias = "db")]
    pub database: ConnectionConfig,
    #[serde(default = "default_runs")]
    pub runs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_volumes")]
    pub volumes: Vec<Volume>,
    #[serde(default = "IndexCase::defaults")]
    pub cases: Vec<IndexCase>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "backend")]
pub enum ConnectionConfig {
    #[serde(rename = "mysql")]
    MySQL {
        #[serde(default = "default_host")]
        host: String,
        #[serde(default = "default_port")]
        port: u16,
        #[serde(default = "default_user")]
        user: String,
        #[serde(default = "default_password")]
        password: String,
        #[serde(default = "default_database")]
        database: String,
    },
    #[serde(rename = "sqlite")]
    SQLite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

/// One data generation scale
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Volume {
    pub customers: u64,
    pub orders: u64,
}

impl Volume {
    pub fn new(customers: u64, orders: u64) -> Self {
        Self { customers, orders }
    }

    /// file name key of the tier, e.g., `10000x50000`
    pub fn key(&self) -> String {
        format!("{}x{}", self.customers, self.orders)
    }

    /// chart and CSV label, e.g., `50,000 orders`
    pub fn label(&self) -> String {
        let digits = self.orders.to_string();
        let grouped = digits
            .as_bytes()
            .rchunks(3)
            .rev()
            .map(|chunk| String::from_utf8_lossy(chunk))
            .join(",");

        format!("{grouped} orders")
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::MySQL {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
        }
    }
}

impl ConnectionConfig {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::MySQL { .. } => Dialect::MySQL,
            Self::SQLite { .. } => Dialect::SQLite,
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            Self::MySQL { .. } => Backend::Mysql,
            Self::SQLite { .. } => Backend::Sqlite,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            database: ConnectionConfig::default(),
            runs: default_runs(),
            batch_size: default_batch_size(),
            seed: None,
            volumes: default_volumes(),
            cases: IndexCase::defaults(),
            output: default_output(),
        }
    }
}

impl BenchConfig {
    /// defaults or the given config file, with command line and environment on top
    pub fn load(cli: &Cli) -> Result<Self, ConfigErrors> {
        let mut config = match cli.config {
            Some(ref path) => Self::from_path(path)?,
            None => Self::default(),
        };

        config.apply_overrides(cli);

        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigErrors> {
        let file = File::open(path).map_err(|source| ConfigErrors::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        match cli.backend {
            Some(backend) if backend != self.database.backend() => {
                self.database = match backend {
                    Backend::Mysql => ConnectionConfig::default(),
                    Backend::Sqlite => ConnectionConfig::SQLite {
                        path: default_sqlite_path(),
                    },
                };
            }
            _ => {}
        }

        match self.database {
            ConnectionConfig::MySQL {
                ref mut host,
                ref mut port,
                ref mut user,
                ref mut password,
                ref mut database,
            } => {
                if let Some(ref value) = cli.host {
                    *host = value.clone();
                }
                if let Some(value) = cli.port {
                    *port = value;
                }
                if let Some(ref value) = cli.user {
                    *user = value.clone();
                }
                if let Some(ref value) = cli.password {
                    *password = value.clone();
                }
                if let Some(ref value) = cli.database {
                    *database = value.clone();
                }
            }
            ConnectionConfig::SQLite { ref mut path } => {
                if let Some(ref value) = cli.path {
                    *path = value.clone();
                }
            }
        }

        if let Some(runs) = cli.runs {
            self.runs = runs;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if let Some(ref output) = cli.output {
            self.output = output.clone();
        }
    }

    pub fn plans_dir(&self) -> PathBuf {
        self.output.join("plans")
    }

    pub fn timings_dir(&self) -> PathBuf {
        self.output.join("timings")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.output.join("charts")
    }

    /// report every problem at once, returns true if the config can't be used
    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        if self.runs < 2 {
            error!(
                "runs must be at least 2, the first timed run is excluded from the mean (got {})",
                self.runs
            );
            contains_error = true;
        }

        if self.batch_size == 0 {
            error!("batch_size cannot be 0");
            contains_error = true;
        }

        if self.volumes.is_empty() {
            error!("No volume was defined, nothing to generate");
            contains_error = true;
        }

        for (position, volume) in self.volumes.iter().enumerate() {
            if volume.orders > 0 && volume.customers == 0 {
                error!(
                    "volumes[{position}] has {} orders but no customers to reference",
                    volume.orders
                );
                contains_error = true;
            }
        }

        // tiers are told apart by their order count in timing rows and charts
        for orders in self.volumes.iter().map(|volume| volume.orders).duplicates() {
            error!("More than one volume has {orders} orders, their results couldn't be told apart");
            contains_error = true;
        }

        if self.cases.is_empty() {
            warn!("No index case was defined, only the data generation will run");
        }

        for name in self.cases.iter().map(|case| &case.name).duplicates() {
            error!("Index case {name} is defined more than once");
            contains_error = true;
        }

        for case in self.cases.iter() {
            let name = &case.name;

            if !is_identifier(name) {
                error!("Index case name {name:?} must be a plain identifier, it is used in DDL and file names");
                contains_error = true;
            }

            if !is_identifier(&case.table) {
                error!("cases.{name}.table {:?} is not a plain identifier", case.table);
                contains_error = true;
            }

            if case.columns.is_empty() {
                error!("cases.{name}.columns is empty, an index needs at least one column");
                contains_error = true;
            }

            for column in case.columns.iter().filter(|column| !is_identifier(column)) {
                error!("cases.{name}.columns contains {column:?}, which is not a plain identifier");
                contains_error = true;
            }

            if case.probe.query.trim().is_empty() {
                error!("cases.{name}.probe.query is empty");
                contains_error = true;
            }
        }

        contains_error
    }
}

fn default_runs() -> usize {
    5
}

fn default_batch_size() -> u64 {
    1000
}

fn default_volumes() -> Vec<Volume> {
    vec![
        Volume::new(10_000, 50_000),
        Volume::new(20_000, 100_000),
        Volume::new(50_000, 250_000),
        Volume::new(100_000, 500_000),
    ]
}

fn default_output() -> PathBuf {
    PathBuf::from("results")
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_owned()
}

fn default_password() -> String {
    "root".to_owned()
}

fn default_database() -> String {
    "indice_teste".to_owned()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("indice_teste.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_labels_group_thousands() {
        assert_eq!(Volume::new(1, 5).label(), "5 orders");
        assert_eq!(Volume::new(1, 5_000).label(), "5,000 orders");
        assert_eq!(Volume::new(1, 500_000).label(), "500,000 orders");
        assert_eq!(Volume::new(1, 1_250_000).label(), "1,250,000 orders");
        assert_eq!(Volume::new(400, 500).key(), "400x500");
    }

    #[test]
    fn defaults_pass_preflight() {
        let config = BenchConfig::default();

        assert!(!config.preflight_checks());
        assert_eq!(config.database.dialect(), Dialect::MySQL);
        assert_eq!(config.volumes.len(), 4);
    }

    #[test]
    fn yaml_overrides_defaults() {
        let config: BenchConfig = serde_yaml::from_str(
            "
db:
  backend: sqlite
  path: /tmp/bench.db
runs: 3
seed: 7
volumes:
  - { customers: 1000, orders: 5000 }
",
        )
        .unwrap();

        assert_eq!(
            config.database,
            ConnectionConfig::SQLite {
                path: PathBuf::from("/tmp/bench.db")
            }
        );
        assert_eq!(config.runs, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.volumes, [Volume::new(1000, 5000)]);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.cases.len(), IndexCase::defaults().len());
    }

    #[test]
    fn example_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config.example.yaml");
        let config = BenchConfig::from_path(&path).unwrap();

        assert!(!config.preflight_checks());
        assert_eq!(config.cases.len(), 2);
        assert_eq!(config.cases[1].label(), "composite index on orders(status, total)");
    }

    #[test]
    fn missing_config_file_is_reported() {
        assert!(matches!(
            BenchConfig::from_path(Path::new("/nonexistent/idxbench.yaml")),
            Err(ConfigErrors::FileNotFound { .. })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<BenchConfig>("repetitions: 3").is_err());
    }

    #[test]
    fn command_line_wins_over_file() {
        let mut config = BenchConfig::default();
        let cli = Cli {
            host: Some("db.internal".into()),
            password: Some("secret".into()),
            runs: Some(10),
            output: Some(PathBuf::from("out")),
            ..Cli::default()
        };

        config.apply_overrides(&cli);

        match config.database {
            ConnectionConfig::MySQL {
                ref host,
                ref password,
                ref user,
                port,
                ..
            } => {
                assert_eq!(host, "db.internal");
                assert_eq!(password, "secret");
                assert_eq!(user, "root");
                assert_eq!(port, 3306);
            }
            ref other => panic!("unexpected backend {other:?}"),
        }
        assert_eq!(config.runs, 10);
        assert_eq!(config.timings_dir(), PathBuf::from("out/timings"));
    }

    #[test]
    fn backend_switch_uses_backend_defaults() {
        let mut config = BenchConfig::default();
        let cli = Cli {
            backend: Some(Backend::Sqlite),
            ..Cli::default()
        };

        config.apply_overrides(&cli);

        assert_eq!(
            config.database,
            ConnectionConfig::SQLite {
                path: default_sqlite_path()
            }
        );
    }

    #[test]
    fn preflight_reports_invalid_settings() {
        let mut config = BenchConfig {
            runs: 1,
            ..BenchConfig::default()
        };
        assert!(config.preflight_checks());

        config.runs = 2;
        config.volumes = vec![Volume::new(0, 10)];
        assert!(config.preflight_checks());

        config.volumes = vec![Volume::new(100, 500), Volume::new(400, 500)];
        assert!(config.preflight_checks());

        config.volumes = vec![Volume::new(10, 10)];
        config.cases.push(config.cases[0].clone());
        assert!(config.preflight_checks());

        config.cases.pop();
        config.cases[0].name = "idx; drop table customers".into();
        assert!(config.preflight_checks());
    }
}
