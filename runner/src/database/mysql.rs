use super::{ConnectionError, Customer, Dialect, Order, Param};
use crate::{cases::Probe, config::ConnectionConfig};
use idxbench_analysis::PlanSnapshot;
use sqlx::{
    mysql::{
        MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlDatabaseError,
        MySqlRow,
    },
    query::Query,
    Column, ConnectOptions, Connection, Executor, QueryBuilder, Row,
};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// ER_CANT_DROP_FIELD_OR_KEY, returned when dropping an index that doesn't exist
const MISSING_INDEX_ERROR: u16 = 1091;
/// upper bound of placeholders in one prepared statement
const MAX_PLACEHOLDERS: usize = 65_535;
const CUSTOMER_COLUMNS: usize = 4;
const ORDER_COLUMNS: usize = 5;

/// Blocking MySQL adapter, drives the async driver on its own current-thread runtime
pub struct MySqlAdapter {
    runtime: Runtime,
    connection: MySqlConnection,
}

impl std::fmt::Debug for MySqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAdapter").finish_non_exhaustive()
    }
}

impl From<sqlx::Error> for ConnectionError {
    fn from(error: sqlx::Error) -> Self {
        ConnectionError::MySQL(error)
    }
}

pub fn is_missing_index(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(error) => error
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|error| error.number() == MISSING_INDEX_ERROR),
        _ => false,
    }
}

fn runtime() -> Result<Runtime, ConnectionError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ConnectionError::Runtime)
}

/// Build connection options without embedding the credentials in a URL string,
/// returns them together with the database name. The database is left
/// unselected for administrative connections.
fn connect_options(
    config: &ConnectionConfig,
    select_database: bool,
) -> Result<(MySqlConnectOptions, &str), ConnectionError> {
    let ConnectionConfig::MySQL {
        host,
        port,
        user,
        password,
        database,
    } = config
    else {
        return Err(ConnectionError::WrongBackend {
            expected: Dialect::MySQL,
            found: config.dialect(),
        });
    };

    let options = MySqlConnectOptions::new()
        .host(host)
        .port(*port)
        .username(user)
        .password(password);

    if select_database {
        Ok((options.database(database), database.as_str()))
    } else {
        Ok((options, database.as_str()))
    }
}

/// split a batch so no multi-row insert exceeds the placeholder limit
fn statement_chunks<T>(batch: &[T], columns: usize) -> std::slice::Chunks<'_, T> {
    batch.chunks((MAX_PLACEHOLDERS / columns).max(1))
}

fn customer_insert(chunk: &[Customer]) -> QueryBuilder<'_, MySql> {
    let mut builder =
        QueryBuilder::<MySql>::new("insert into customers (name, email, birth_date, address) ");
    builder.push_values(chunk, |mut row, customer| {
        row.push_bind(customer.name.as_str())
            .push_bind(customer.email.as_str())
            .push_bind(customer.birth_date)
            .push_bind(customer.address.as_str());
    });

    builder
}

fn order_insert(chunk: &[Order]) -> QueryBuilder<'_, MySql> {
    let mut builder = QueryBuilder::<MySql>::new(
        "insert into orders (customer_id, total, description, order_date, status) ",
    );
    builder.push_values(chunk, |mut row, order| {
        row.push_bind(order.customer_id)
            .push_bind(order.total)
            .push_bind(order.description.as_str())
            .push_bind(order.order_date)
            .push_bind(order.status.as_str());
    });

    builder
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [Param],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            Param::Int(value) => query.bind(*value),
            Param::Float(value) => query.bind(*value),
            Param::Text(value) => query.bind(value.as_str()),
        };
    }

    query
}

/// explain output mixes text, integer and floating point columns, try them in order
fn cell(row: &MySqlRow, index: usize) -> String {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(|value| value.to_string()).unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map(|value| value.to_string()).unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map(|value| value.to_string()).unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return value
            .map(|value| String::from_utf8_lossy(&value).into_owned())
            .unwrap_or_default();
    }

    String::new()
}

impl MySqlAdapter {
    pub fn ensure_database(config: &ConnectionConfig) -> Result<(), ConnectionError> {
        let (options, database) = connect_options(config, false)?;

        runtime()?.block_on(async {
            let mut connection = options.connect().await?;
            connection
                .execute(format!("create database if not exists `{database}`").as_str())
                .await?;
            connection.close().await?;

            info!(database = %database, "Database is present");

            Ok::<(), ConnectionError>(())
        })
    }

    pub fn load(config: &ConnectionConfig) -> Result<Self, ConnectionError> {
        let runtime = runtime()?;
        let (options, _) = connect_options(config, true)?;
        let connection = runtime.block_on(options.connect())?;

        info!("Opened MySQL connection");

        Ok(Self {
            runtime,
            connection,
        })
    }

    pub fn execute(&mut self, sql: &str) -> Result<u64, ConnectionError> {
        let connection = &mut self.connection;
        let result = self.runtime.block_on(connection.execute(sql))?;

        debug!(
            statement = sql,
            changed = result.rows_affected(),
            "Executed statement"
        );

        Ok(result.rows_affected())
    }

    pub fn insert_customers(&mut self, batch: &[Customer]) -> Result<(), ConnectionError> {
        let statements = statement_chunks(batch, CUSTOMER_COLUMNS)
            .map(customer_insert)
            .collect();

        self.insert(statements)
    }

    pub fn insert_orders(&mut self, batch: &[Order]) -> Result<(), ConnectionError> {
        let statements = statement_chunks(batch, ORDER_COLUMNS)
            .map(order_insert)
            .collect();

        self.insert(statements)
    }

    /// run all statements of one batch in a single transaction
    fn insert(&mut self, mut statements: Vec<QueryBuilder<'_, MySql>>) -> Result<(), ConnectionError> {
        if statements.is_empty() {
            return Ok(());
        }

        let connection = &mut self.connection;
        self.runtime.block_on(async move {
            let mut tx = connection.begin().await?;
            for builder in statements.iter_mut() {
                builder.build().execute(&mut *tx).await?;
            }
            tx.commit().await?;

            Ok::<(), ConnectionError>(())
        })
    }

    pub fn customer_ids(&mut self) -> Result<Vec<i64>, ConnectionError> {
        let connection = &mut self.connection;
        let ids: Vec<i32> = self.runtime.block_on(
            sqlx::query_scalar("select id from customers order by id").fetch_all(connection),
        )?;

        Ok(ids.into_iter().map(i64::from).collect())
    }

    pub fn count(&mut self, table: &str) -> Result<u64, ConnectionError> {
        let connection = &mut self.connection;
        let sql = format!("select count(*) from {table}");
        let count: i64 = self
            .runtime
            .block_on(sqlx::query_scalar(&sql).fetch_one(connection))?;

        Ok(count as u64)
    }

    pub fn fetch_all(&mut self, probe: &Probe) -> Result<usize, ConnectionError> {
        let connection = &mut self.connection;
        let rows = self.runtime.block_on(
            bind_params(sqlx::query(&probe.query), &probe.params).fetch_all(connection),
        )?;

        Ok(rows.len())
    }

    pub fn explain(&mut self, probe: &Probe) -> Result<PlanSnapshot, ConnectionError> {
        let connection = &mut self.connection;
        let sql = format!("explain {}", probe.query);
        let rows = self
            .runtime
            .block_on(bind_params(sqlx::query(&sql), &probe.params).fetch_all(connection))?;

        let headers: Vec<String> = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| column.name().to_owned())
                    .collect()
            })
            .unwrap_or_default();
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| (0..row.len()).map(|index| cell(row, index)).collect())
            .collect();

        Ok(PlanSnapshot { headers, rows })
    }

    pub fn index_exists(&mut self, table: &str, index: &str) -> Result<bool, ConnectionError> {
        let connection = &mut self.connection;
        let count: i64 = self.runtime.block_on(
            sqlx::query_scalar(
                "select count(*) from information_schema.statistics
                 where table_schema = database() and table_name = ? and index_name = ?",
            )
            .bind(table)
            .bind(index)
            .fetch_one(connection),
        )?;

        Ok(count > 0)
    }

    pub fn close(self) -> Result<(), ConnectionError> {
        let Self {
            runtime,
            connection,
        } = self;
        runtime.block_on(connection.close())?;

        info!("Closed MySQL connection");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Status;
    use chrono::NaiveDate;
    use sqlx::{Arguments, Execute};
    use std::path::PathBuf;

    fn order() -> Order {
        Order {
            customer_id: 1,
            total: 99.9,
            description: "Pedido importante.".into(),
            order_date: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            status: Status::Shipped,
        }
    }

    #[test]
    fn sqlite_config_is_rejected() {
        let config = ConnectionConfig::SQLite {
            path: PathBuf::from(":memory:"),
        };

        assert!(matches!(
            connect_options(&config, true),
            Err(ConnectionError::WrongBackend {
                expected: Dialect::MySQL,
                found: Dialect::SQLite
            })
        ));
    }

    #[test]
    fn connect_options_keep_database_name() {
        let config = ConnectionConfig::default();
        let (_, database) = connect_options(&config, false).unwrap();

        assert_eq!(database, "indice_teste");
    }

    #[test]
    fn params_are_bound_in_order() {
        let params = [
            Param::Text("Enviado".into()),
            Param::Int(500),
            Param::Float(1.5),
        ];
        let mut query = bind_params(
            sqlx::query("select * from orders where status = ? and total > ? and total < ?"),
            &params,
        );

        let arguments = query.take_arguments().unwrap().unwrap();
        assert_eq!(arguments.len(), params.len());
    }

    #[test]
    fn large_batches_stay_below_placeholder_limit() {
        let batch = vec![order(); 20_000];

        let rows = statement_chunks(&batch, ORDER_COLUMNS)
            .map(|chunk| chunk.len())
            .collect::<Vec<_>>();
        assert_eq!(rows, [13_107, 6_893]);

        for chunk in statement_chunks(&batch, ORDER_COLUMNS) {
            let builder = order_insert(chunk);
            let placeholders = builder.sql().matches('?').count();

            assert_eq!(placeholders, chunk.len() * ORDER_COLUMNS);
            assert!(placeholders <= MAX_PLACEHOLDERS);
        }

        assert_eq!(statement_chunks(&batch[..1000], CUSTOMER_COLUMNS).count(), 1);
        assert_eq!(statement_chunks::<Order>(&[], ORDER_COLUMNS).count(), 0);
    }

    #[test]
    fn only_database_errors_can_be_missing_indexes() {
        assert!(!is_missing_index(&sqlx::Error::RowNotFound));
    }
}
