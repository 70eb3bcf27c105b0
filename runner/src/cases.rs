use crate::database::{ConnectionError, Dialect, Param};
use chrono::{Datelike, Local};
use idxbench_analysis::IndexState;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Unique,
    #[serde(alias = "b-tree")]
    BTree,
    Hash,
    #[serde(alias = "full-text")]
    FullText,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unique => "UNIQUE",
            Self::BTree => "B-Tree",
            Self::Hash => "HASH",
            Self::FullText => "FULLTEXT",
        })
    }
}

/// A query executed and timed by the harness
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Probe {
    pub query: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Probe {
    pub fn new(query: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }
}

/// One benchmarked index: where it goes, how it is built and which query should profit from it
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IndexCase {
    /// index name, also used for the artifact file names
    pub name: String,
    /// human readable description, defaults to kind and columns
    #[serde(default)]
    pub label: Option<String>,
    pub table: String,
    pub columns: Vec<String>,
    pub kind: IndexKind,
    pub probe: Probe,
    /// query used once the index exists, e.g., a full-text predicate that the
    /// engine rejects without a full-text index
    #[serde(default)]
    pub indexed_probe: Option<Probe>,
}

impl IndexCase {
    pub fn new(
        name: &str,
        table: &str,
        columns: &[&str],
        kind: IndexKind,
        probe: Probe,
    ) -> Self {
        Self {
            name: name.to_owned(),
            label: None,
            table: table.to_owned(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            kind,
            probe,
            indexed_probe: None,
        }
    }

    pub fn with_indexed_probe(mut self, probe: Probe) -> Self {
        self.indexed_probe = Some(probe);
        self
    }

    pub fn label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None if self.columns.len() > 1 => format!(
                "composite {} index on {}({})",
                self.kind,
                self.table,
                self.columns.join(", ")
            ),
            None => format!(
                "{} index on {}({})",
                self.kind,
                self.table,
                self.columns.join(", ")
            ),
        }
    }

    pub fn probe_for(&self, state: IndexState) -> &Probe {
        match (state, &self.indexed_probe) {
            (IndexState::Indexed, Some(probe)) => probe,
            _ => &self.probe,
        }
    }

    pub fn create_statement(&self, dialect: Dialect) -> Result<String, ConnectionError> {
        let name = &self.name;
        let table = &self.table;
        let columns = self.columns.join(", ");

        match (dialect, self.kind) {
            (_, IndexKind::BTree) => Ok(format!("create index {name} on {table}({columns})")),
            (_, IndexKind::Unique) => Ok(format!(
                "create unique index {name} on {table}({columns})"
            )),
            (Dialect::MySQL, IndexKind::Hash) => Ok(format!(
                "create index {name} using hash on {table}({columns})"
            )),
            (Dialect::MySQL, IndexKind::FullText) => Ok(format!(
                "create fulltext index {name} on {table}({columns})"
            )),
            (Dialect::SQLite, kind @ (IndexKind::Hash | IndexKind::FullText)) => {
                Err(ConnectionError::UnsupportedIndex { kind, dialect })
            }
        }
    }

    pub fn drop_statement(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::MySQL => format!("drop index {} on {}", self.name, self.table),
            Dialect::SQLite => format!("drop index {}", self.name),
        }
    }

    /// The fixed benchmark sequence used when no config file names its own cases.
    /// Date probes target the current year, the generator places orders there.
    pub fn defaults() -> Vec<IndexCase> {
        let year = Local::now().year();

        vec![
            IndexCase::new(
                "idx_cust_email",
                "customers",
                &["email"],
                IndexKind::Unique,
                Probe::new(
                    "select * from customers where email like ?",
                    vec!["%@gmail.com".into()],
                ),
            ),
            IndexCase::new(
                "idx_ord_date",
                "orders",
                &["order_date"],
                IndexKind::BTree,
                Probe::new(
                    "select * from orders where order_date between ? and ?",
                    vec![
                        Param::Text(format!("{year}-01-01 00:00:00")),
                        Param::Text(format!("{year}-06-30 23:59:59")),
                    ],
                ),
            ),
            IndexCase::new(
                "idx_ord_status",
                "orders",
                &["status"],
                IndexKind::BTree,
                Probe::new(
                    "select * from orders where status = ?",
                    vec!["Entregue".into()],
                ),
            ),
            IndexCase::new(
                "idx_ord_total",
                "orders",
                &["total"],
                IndexKind::BTree,
                Probe::new("select * from orders where total > ?", vec![Param::Int(500)]),
            ),
            IndexCase::new(
                "idx_ord_status_total",
                "orders",
                &["status", "total"],
                IndexKind::BTree,
                Probe::new(
                    "select * from orders where status = ? and total > ?",
                    vec!["Enviado".into(), Param::Int(500)],
                ),
            ),
            IndexCase::new(
                "idx_ord_status_hash",
                "orders",
                &["status"],
                IndexKind::Hash,
                Probe::new(
                    "select * from orders where status = ?",
                    vec!["Pendente".into()],
                ),
            ),
            IndexCase::new(
                "idx_ord_desc",
                "orders",
                &["description"],
                IndexKind::FullText,
                Probe::new(
                    "select * from orders where description like ?",
                    vec!["%importante%".into()],
                ),
            )
            .with_indexed_probe(Probe::new(
                "select * from orders where match(description) against(? in boolean mode)",
                vec!["importante".into()],
            )),
        ]
    }
}
