use crate::{
    config::ConnectionConfig,
    database::{ConnectionAdapters, ConnectionError, Dialect},
};
use tracing::{error, info, instrument};

// ref: https://dev.mysql.com/doc/refman/8.0/en/create-table-foreign-keys.html
pub const MYSQL_SCHEMA: [&str; 4] = [
    "drop table if exists orders",
    "drop table if exists customers",
    "create table customers (
    id int auto_increment primary key,
    name varchar(100),
    email varchar(100),
    birth_date date,
    address text
) engine=InnoDB",
    "create table orders (
    id int auto_increment primary key,
    customer_id int,
    total decimal(10,2),
    description text,
    order_date datetime,
    status varchar(20),
    foreign key (customer_id) references customers (id)
) engine=InnoDB",
];

pub const SQLITE_SCHEMA: [&str; 4] = [
    "drop table if exists orders",
    "drop table if exists customers",
    "create table customers (
    id integer primary key autoincrement,
    name varchar(100),
    email varchar(100),
    birth_date date,
    address text
)",
    "create table orders (
    id integer primary key autoincrement,
    customer_id integer references customers (id),
    total decimal(10,2),
    description text,
    order_date datetime,
    status varchar(20)
)",
];

pub fn schema(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::MySQL => &MYSQL_SCHEMA,
        Dialect::SQLite => &SQLITE_SCHEMA,
    }
}

/// idempotent, creates the target database if it's missing
pub fn ensure_database(config: &ConnectionConfig) -> Result<(), ConnectionError> {
    ConnectionAdapters::ensure_database(config)
}

/// drop and recreate both tables, every row is lost
#[instrument(skip(connection), level = "info")]
pub fn reset_schema(connection: &mut ConnectionAdapters) -> Result<(), ConnectionError> {
    let statements = schema(connection.dialect());
    let total = statements.len();

    for (counter, statement) in statements.iter().enumerate() {
        match connection.execute(statement) {
            Ok(_) => info!("Applied SQL schema ({}/{total})", counter + 1),
            Err(error) => {
                error!(error = ?error, statement = statement, "Failed to apply SQL schema ({}/{total}): {error}", counter + 1);

                return Err(error);
            }
        }
    }

    Ok(())
}

/// remove all rows, orders before customers to satisfy the foreign key
pub fn clear(connection: &mut ConnectionAdapters) -> Result<(), ConnectionError> {
    let orders = connection.execute("delete from orders")?;
    let customers = connection.execute("delete from customers")?;

    info!(orders, customers, "Cleared tables");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn memory() -> ConnectionAdapters {
        ConnectionAdapters::load(&ConnectionConfig::SQLite {
            path: PathBuf::from(":memory:"),
        })
        .unwrap()
    }

    #[test]
    fn reset_is_repeatable() {
        let mut connection = memory();

        reset_schema(&mut connection).unwrap();
        reset_schema(&mut connection).unwrap();

        assert_eq!(connection.count("customers").unwrap(), 0);
        assert_eq!(connection.count("orders").unwrap(), 0);
    }

    #[test]
    fn reset_drops_existing_rows() {
        let mut connection = memory();
        reset_schema(&mut connection).unwrap();
        connection
            .execute("insert into customers (name, email) values ('Ana', 'ana@gmail.com')")
            .unwrap();

        reset_schema(&mut connection).unwrap();

        assert_eq!(connection.count("customers").unwrap(), 0);
    }

    #[test]
    fn clear_respects_foreign_keys() {
        let mut connection = memory();
        reset_schema(&mut connection).unwrap();
        connection
            .execute("insert into customers (name, email) values ('Ana', 'ana@gmail.com')")
            .unwrap();
        connection
            .execute("insert into orders (customer_id, status) values (1, 'Pendente')")
            .unwrap();

        clear(&mut connection).unwrap();

        assert_eq!(connection.count("orders").unwrap(), 0);
        assert_eq!(connection.count("customers").unwrap(), 0);
    }

    #[test]
    fn ensure_database_creates_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bench.db");

        ensure_database(&ConnectionConfig::SQLite { path: path.clone() }).unwrap();
        ensure_database(&ConnectionConfig::SQLite { path: path.clone() }).unwrap();

        assert!(path.is_file());
    }
}
