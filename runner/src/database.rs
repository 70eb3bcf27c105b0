#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "rusqlite")]
pub mod sqlite;
pub mod util;
#[cfg(test)]
mod util_test;

use crate::{
    cases::{IndexKind, Probe},
    config::ConnectionConfig,
};
use chrono::{NaiveDate, NaiveDateTime};
use idxbench_analysis::PlanSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[cfg(not(any(feature = "mysql", feature = "rusqlite")))]
compile_error!("at least one of the `mysql` or `rusqlite` features has to be enabled");

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub customer_id: i64,
    pub total: f64,
    pub description: String,
    pub order_date: NaiveDateTime,
    pub status: Status,
}

/// order status vocabulary, stored with its portuguese labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Processing,
        Status::Shipped,
        Status::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Processing => "Processando",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregue",
        }
    }
}

/// A bind parameter of a probe query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySQL,
    SQLite,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[cfg(feature = "rusqlite")]
    #[error("SQLite error: {0}")]
    SQLite(rusqlite::Error),
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    MySQL(sqlx::Error),
    #[error("Failed to start the runtime of the MySQL driver: {0}")]
    Runtime(std::io::Error),
    #[error("Failed to prepare the database location: {0}")]
    Io(#[from] std::io::Error),
    #[error("{kind} indexes are not supported by {dialect}")]
    UnsupportedIndex { kind: IndexKind, dialect: Dialect },
    #[error("{0} support was not compiled into this binary")]
    BackendDisabled(Dialect),
    #[error("{expected} adapter received a {found} configuration")]
    WrongBackend { expected: Dialect, found: Dialect },
}

impl ConnectionError {
    /// true if the error only states that the index to drop doesn't exist
    pub fn is_missing_index(&self) -> bool {
        match self {
            #[cfg(feature = "rusqlite")]
            Self::SQLite(error) => sqlite::is_missing_index(error),
            #[cfg(feature = "mysql")]
            Self::MySQL(error) => mysql::is_missing_index(error),
            _ => false,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $adapter:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "mysql")]
            ConnectionAdapters::MySQL($adapter) => $call,
            #[cfg(feature = "rusqlite")]
            ConnectionAdapters::SQLite($adapter) => $call,
        }
    };
}

/// All storage adapters, one variant per supported engine.
/// Every call blocks until the engine answered.
#[derive(Debug)]
pub enum ConnectionAdapters {
    #[cfg(feature = "mysql")]
    MySQL(mysql::MySqlAdapter),
    #[cfg(feature = "rusqlite")]
    SQLite(sqlite::SqliteAdapter),
}

impl ConnectionAdapters {
    /// create the target database if it doesn't exist yet, using a separate
    /// administrative connection that is closed again afterwards
    pub fn ensure_database(config: &ConnectionConfig) -> Result<(), ConnectionError> {
        match config {
            #[cfg(feature = "mysql")]
            ConnectionConfig::MySQL { .. } => mysql::MySqlAdapter::ensure_database(config),
            #[cfg(feature = "rusqlite")]
            ConnectionConfig::SQLite { path } => sqlite::SqliteAdapter::ensure_database(path),
            #[allow(unreachable_patterns)]
            other => Err(ConnectionError::BackendDisabled(other.dialect())),
        }
    }

    pub fn load(config: &ConnectionConfig) -> Result<Self, ConnectionError> {
        match config {
            #[cfg(feature = "mysql")]
            ConnectionConfig::MySQL { .. } => Ok(Self::MySQL(mysql::MySqlAdapter::load(config)?)),
            #[cfg(feature = "rusqlite")]
            ConnectionConfig::SQLite { path } => {
                Ok(Self::SQLite(sqlite::SqliteAdapter::load(path)?))
            }
            #[allow(unreachable_patterns)]
            other => Err(ConnectionError::BackendDisabled(other.dialect())),
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            #[cfg(feature = "mysql")]
            Self::MySQL(_) => Dialect::MySQL,
            #[cfg(feature = "rusqlite")]
            Self::SQLite(_) => Dialect::SQLite,
        }
    }

    /// run a single statement without parameters and commit it
    pub fn execute(&mut self, sql: &str) -> Result<u64, ConnectionError> {
        dispatch!(self, adapter => adapter.execute(sql))
    }

    /// insert a batch of customers in one transaction
    pub fn insert_customers(&mut self, batch: &[Customer]) -> Result<(), ConnectionError> {
        dispatch!(self, adapter => adapter.insert_customers(batch))
    }

    /// insert a batch of orders in one transaction
    pub fn insert_orders(&mut self, batch: &[Order]) -> Result<(), ConnectionError> {
        dispatch!(self, adapter => adapter.insert_orders(batch))
    }

    pub fn customer_ids(&mut self) -> Result<Vec<i64>, ConnectionError> {
        dispatch!(self, adapter => adapter.customer_ids())
    }

    pub fn count(&mut self, table: &str) -> Result<u64, ConnectionError> {
        dispatch!(self, adapter => adapter.count(table))
    }

    /// execute the probe and fetch every row, returns the number of rows
    pub fn fetch_all(&mut self, probe: &Probe) -> Result<usize, ConnectionError> {
        dispatch!(self, adapter => adapter.fetch_all(probe))
    }

    pub fn explain(&mut self, probe: &Probe) -> Result<PlanSnapshot, ConnectionError> {
        dispatch!(self, adapter => adapter.explain(probe))
    }

    pub fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, ConnectionError> {
        dispatch!(self, adapter => adapter.index_exists(table, index))
    }

    pub fn close(self) -> Result<(), ConnectionError> {
        dispatch!(self, adapter => adapter.close())
    }
}
