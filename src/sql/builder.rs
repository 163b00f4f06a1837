//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE over the static table definitions.

use crate::sql::params::PgBindValue;
use crate::store::{SortField, Window};

pub struct Column {
    pub name: &'static str,
    /// PostgreSQL type used to cast bound parameters (e.g. `$1::bigint`).
    pub pg_type: &'static str,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub static CONTACTS: Table = Table {
    name: "contacts",
    columns: &[
        Column { name: "id", pg_type: "bigint" },
        Column { name: "name_first", pg_type: "varchar" },
        Column { name: "name_last", pg_type: "varchar" },
        Column { name: "email", pg_type: "varchar" },
        Column { name: "twitter", pg_type: "varchar" },
        Column { name: "created_at", pg_type: "timestamptz" },
        Column { name: "updated_at", pg_type: "timestamptz" },
    ],
};

pub static PHONE_NUMBERS: Table = Table {
    name: "phone_numbers",
    columns: &[
        Column { name: "id", pg_type: "bigint" },
        Column { name: "contact_id", pg_type: "bigint" },
        Column { name: "name", pg_type: "varchar" },
        Column { name: "phone_number", pg_type: "varchar" },
        Column { name: "created_at", pg_type: "timestamptz" },
        Column { name: "updated_at", pg_type: "timestamptz" },
    ],
};

const PK: &str = "id";

/// Quote identifier for PostgreSQL (safe: only from static definitions).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its cast placeholder for `column`.
    fn placeholder(&mut self, table: &Table, column: &str, v: PgBindValue) -> String {
        self.params.push(v);
        let n = self.params.len();
        table
            .column(column)
            .map(|c| format!("${}::{}", n, c.pg_type))
            .unwrap_or_else(|| format!("${}", n))
    }
}

/// `column IN (...)` condition. An empty value list matches nothing.
pub struct Condition {
    pub column: &'static str,
    pub values: Vec<PgBindValue>,
}

fn column_list(table: &Table) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, table: &Table, conditions: &[Condition]) -> String {
    let mut parts = Vec::new();
    for cond in conditions {
        if cond.values.is_empty() {
            parts.push("1 = 0".to_string());
            continue;
        }
        let placeholders: Vec<String> = cond
            .values
            .iter()
            .map(|v| q.placeholder(table, cond.column, v.clone()))
            .collect();
        parts.push(format!("{} IN ({})", quoted(cond.column), placeholders.join(", ")));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn order_clause(table: &Table, sort: &[SortField]) -> String {
    let mut terms: Vec<String> = sort
        .iter()
        .filter(|s| table.column(s.field).is_some())
        .map(|s| format!("{} {}", quoted(s.field), if s.descending { "DESC" } else { "ASC" }))
        .collect();
    if !sort.iter().any(|s| s.field == PK) {
        terms.push(format!("{} ASC", quoted(PK)));
    }
    format!(" ORDER BY {}", terms.join(", "))
}

/// SELECT with `IN` conditions, ORDER BY the sort terms then id, optional LIMIT/OFFSET.
pub fn select_list(table: &Table, conditions: &[Condition], sort: &[SortField], window: Window) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, conditions);
    let limit_sql = window.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_sql = if window.offset > 0 {
        format!(" OFFSET {}", window.offset)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}",
        column_list(table),
        quoted(table.name),
        where_sql,
        order_clause(table, sort),
        limit_sql,
        offset_sql
    );
    q
}

/// COUNT(*) under the same conditions as `select_list`.
pub fn count(table: &Table, conditions: &[Condition]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, table, conditions);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(table.name), where_sql);
    q
}

/// SELECT by primary key. Caller binds the id as the sole param.
pub fn select_by_id(table: &Table) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        column_list(table),
        quoted(table.name),
        quoted(PK)
    );
    q
}

/// INSERT the given column values; omitted columns take their DB defaults (id, timestamps).
pub fn insert(table: &Table, values: Vec<(&'static str, PgBindValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (col, v) in values {
        if table.column(col).is_none() {
            continue;
        }
        placeholders.push(q.placeholder(table, col, v));
        cols.push(quoted(col));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(table.name),
            column_list(table)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(table.name),
            cols.join(", "),
            placeholders.join(", "),
            column_list(table)
        )
    };
    q
}

/// UPDATE by id: SET only the given columns, plus `updated_at = NOW()`.
pub fn update(table: &Table, id: i64, values: Vec<(&'static str, PgBindValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (col, v) in values {
        if col == PK || table.column(col).is_none() {
            continue;
        }
        let rhs = q.placeholder(table, col, v);
        sets.push(format!("{} = {}", quoted(col), rhs));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_ph = q.placeholder(table, PK, PgBindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        quoted(PK),
        id_ph,
        column_list(table)
    );
    q
}

/// DELETE by id. Caller binds the id as the sole param.
pub fn delete(table: &Table) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        quoted(table.name),
        quoted(PK),
        quoted(PK)
    );
    q
}
