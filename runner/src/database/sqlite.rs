use super::{ConnectionError, Customer, Order, Param};
use crate::cases::Probe;
use idxbench_analysis::PlanSnapshot;
use rusqlite::{
    params, params_from_iter,
    types::{ToSqlOutput, ValueRef},
    Connection, ToSql,
};
use std::{fmt::Debug, fs, path::Path};
use tracing::{debug, error, info, warn};

const IN_MEMORY: &str = ":memory:";
const CLOSE_ATTEMPTS: u32 = 3;

#[derive(Debug)]
pub struct SqliteAdapter {
    connection: Connection,
}

impl From<rusqlite::Error> for ConnectionError {
    fn from(error: rusqlite::Error) -> Self {
        ConnectionError::SQLite(error)
    }
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Int(value) => ToSqlOutput::from(*value),
            Param::Float(value) => ToSqlOutput::from(*value),
            Param::Text(value) => ToSqlOutput::from(value.as_str()),
        })
    }
}

pub fn is_missing_index(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.starts_with("no such index")
    )
}

fn cell(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(value) | ValueRef::Blob(value) => {
            String::from_utf8_lossy(value).into_owned()
        }
    }
}

impl SqliteAdapter {
    /// sqlite creates the database file on open, only the parent directory has to exist
    pub fn ensure_database(path: &Path) -> Result<(), ConnectionError> {
        if path.as_os_str() == IN_MEMORY {
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Connection::open(path)?
            .close()
            .map_err(|(_, error)| ConnectionError::SQLite(error))?;

        info!(path = ?path, "Database file is present");

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConnectionError> {
        let connection = Connection::open(path)?;
        connection.execute_batch("pragma foreign_keys = on;")?;

        info!(path = ?path, "Opened SQLite connection");

        Ok(Self { connection })
    }

    pub fn execute(&mut self, sql: &str) -> Result<u64, ConnectionError> {
        let changed = self.connection.execute(sql, [])?;

        debug!(statement = sql, changed = changed, "Executed statement");

        Ok(changed as u64)
    }

    pub fn insert_customers(&mut self, batch: &[Customer]) -> Result<(), ConnectionError> {
        let tx = self.connection.transaction()?;
        {
            let mut statement = tx.prepare_cached(
                "insert into customers
                 (name, email, birth_date, address)
                 values (?, ?, ?, ?)",
            )?;

            for customer in batch {
                statement.execute(params![
                    customer.name,
                    customer.email,
                    customer.birth_date,
                    customer.address
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    pub fn insert_orders(&mut self, batch: &[Order]) -> Result<(), ConnectionError> {
        let tx = self.connection.transaction()?;
        {
            let mut statement = tx.prepare_cached(
                "insert into orders
                 (customer_id, total, description, order_date, status)
                 values (?, ?, ?, ?, ?)",
            )?;

            for order in batch {
                statement.execute(params![
                    order.customer_id,
                    order.total,
                    order.description,
                    order.order_date,
                    order.status.as_str()
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    pub fn customer_ids(&mut self) -> Result<Vec<i64>, ConnectionError> {
        self.connection
            .prepare_cached("select id from customers order by id")?
            .query_map([], |row| row.get(0))?
            .try_fold(Vec::new(), |mut init, result| {
                init.push(result?);

                Ok::<Vec<i64>, ConnectionError>(init)
            })
    }

    pub fn count(&mut self, table: &str) -> Result<u64, ConnectionError> {
        let count: i64 =
            self.connection
                .query_row(&format!("select count(*) from {table}"), [], |row| {
                    row.get(0)
                })?;

        Ok(count as u64)
    }

    pub fn fetch_all(&mut self, probe: &Probe) -> Result<usize, ConnectionError> {
        let mut statement = self.connection.prepare_cached(&probe.query)?;
        let columns = statement.column_count();
        let mut rows = statement.query(params_from_iter(probe.params.iter()))?;
        let mut fetched = 0;

        while let Some(row) = rows.next()? {
            for index in 0..columns {
                row.get_ref(index)?;
            }

            fetched += 1;
        }

        Ok(fetched)
    }

    pub fn explain(&mut self, probe: &Probe) -> Result<PlanSnapshot, ConnectionError> {
        let mut statement = self
            .connection
            .prepare(&format!("explain query plan {}", probe.query))?;
        let headers: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let columns = headers.len();

        let rows = statement
            .query_map(params_from_iter(probe.params.iter()), |row| {
                (0..columns)
                    .map(|index| row.get_ref(index).map(cell))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })?
            .collect::<rusqlite::Result<Vec<Vec<String>>>>()?;

        Ok(PlanSnapshot { headers, rows })
    }

    pub fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, ConnectionError> {
        let count: i64 = self
            .connection
            .prepare_cached(
                "select count(*) from sqlite_master
                 where type = 'index' and tbl_name = ? and name = ?",
            )?
            .query_row(params![table, index], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// closing fails while statements are still busy, retried up to `CLOSE_ATTEMPTS` times
    pub fn close(self) -> Result<(), ConnectionError> {
        let mut connection = self.connection;

        for attempt in 1..=CLOSE_ATTEMPTS {
            match connection.close() {
                Ok(()) => {
                    info!("Closed SQLite connection");
                    return Ok(());
                }
                Err((_, error)) if attempt == CLOSE_ATTEMPTS => {
                    error!(error = ?error, "SQLite connection still open after {attempt} attempts, giving up");
                    return Err(ConnectionError::SQLite(error));
                }
                Err((unclosed, error)) => {
                    warn!(error = ?error, "Closing the SQLite connection failed (attempt {attempt}/{CLOSE_ATTEMPTS}): {error}");
                    connection = unclosed;
                }
            }
        }

        Ok(())
    }
}
