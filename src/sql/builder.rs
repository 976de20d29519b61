//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from an entity definition.
//! Identifiers come from static definitions only; values are always parameters.

use crate::config::{ColumnKind, Dependent, EntityDef, FilterOp};
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its placeholder, cast to the column type when one is needed.
    fn placeholder(&mut self, v: Value, kind: ColumnKind) -> String {
        self.params.push(v);
        let n = self.params.len();
        match kind.cast() {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        }
    }
}

/// One whitelisted filter resolved against its column. Values are ORed; conditions are ANDed.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub kind: ColumnKind,
    pub op: FilterOp,
    pub values: Vec<Value>,
}

/// SELECT list: id plus fillable columns; decimals read back as float8.
fn select_column_list(entity: &EntityDef) -> String {
    std::iter::once(quoted("id"))
        .chain(entity.columns.iter().map(|c| {
            let q = quoted(c.name);
            match c.kind {
                ColumnKind::Decimal { .. } => format!("{}::float8 AS {}", q, q),
                _ => q,
            }
        }))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

fn where_clause(q: &mut QueryBuf, conditions: &[Condition]) -> String {
    let mut parts = Vec::new();
    for cond in conditions {
        if cond.values.is_empty() {
            continue;
        }
        let col = quoted(cond.column);
        match cond.op {
            FilterOp::Exact => {
                let phs: Vec<String> = cond
                    .values
                    .iter()
                    .map(|v| q.placeholder(v.clone(), cond.kind))
                    .collect();
                if phs.len() == 1 {
                    parts.push(format!("{} = {}", col, phs[0]));
                } else {
                    parts.push(format!("{} IN ({})", col, phs.join(", ")));
                }
            }
            FilterOp::Partial => {
                let target = match cond.kind {
                    ColumnKind::Text { .. } => col,
                    _ => format!("{}::text", col),
                };
                let likes: Vec<String> = cond
                    .values
                    .iter()
                    .map(|v| {
                        let s = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        q.params.push(Value::String(like_pattern(&s)));
                        format!("{} ILIKE ${}", target, q.params.len())
                    })
                    .collect();
                if likes.len() == 1 {
                    parts.push(likes[0].clone());
                } else {
                    parts.push(format!("({})", likes.join(" OR ")));
                }
            }
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT one page ORDER BY id.
pub fn select_page(entity: &EntityDef, conditions: &[Condition], limit: u32, offset: u64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, conditions);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_column_list(entity),
        quoted(entity.table),
        where_sql,
        quoted("id"),
        limit,
        offset
    );
    q
}

/// COUNT(*) under the same conditions as `select_page`.
pub fn count(entity: &EntityDef, conditions: &[Condition]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, conditions);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(entity.table), where_sql);
    q
}

pub fn select_by_id(entity: &EntityDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(Value::from(id), ColumnKind::BigInt);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(entity),
        quoted(entity.table),
        quoted("id"),
        ph
    );
    q
}

/// INSERT the fillable columns present in body. Returns the created row.
pub fn insert(entity: &EntityDef, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.columns {
        let Some(v) = body.get(c.name) else { continue };
        placeholders.push(q.placeholder(v.clone(), c.kind));
        cols.push(quoted(c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(entity.table),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(entity)
    );
    q
}

/// UPDATE by id: SET only fillable columns present in body, and bump updated_at.
pub fn update(entity: &EntityDef, id: i64, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in entity.columns {
        let Some(v) = body.get(c.name) else { continue };
        let rhs = q.placeholder(v.clone(), c.kind);
        sets.push(format!("{} = {}", quoted(c.name), rhs));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_ph = q.placeholder(Value::from(id), ColumnKind::BigInt);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(entity.table),
        sets.join(", "),
        quoted("id"),
        id_ph,
        select_column_list(entity)
    );
    q
}

pub fn delete(entity: &EntityDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(Value::from(id), ColumnKind::BigInt);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(entity.table),
        quoted("id"),
        ph,
        quoted("id")
    );
    q
}

/// EXISTS check for unique/exists rules. `ignore_id` excludes the row being updated.
pub fn value_exists(
    table: &str,
    column: &str,
    kind: ColumnKind,
    value: &Value,
    ignore_id: Option<i64>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(value.clone(), kind);
    let mut sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = {}",
        quoted(table),
        quoted(column),
        ph
    );
    if let Some(id) = ignore_id {
        let id_ph = q.placeholder(Value::from(id), ColumnKind::BigInt);
        sql.push_str(&format!(" AND {} <> {}", quoted("id"), id_ph));
    }
    sql.push(')');
    q.sql = sql;
    q
}

/// EXISTS check for rows referencing `id` through a dependent foreign key.
pub fn dependents_exist(dependent: &Dependent, id: i64) -> QueryBuf {
    value_exists(
        dependent.table,
        dependent.column,
        ColumnKind::BigInt,
        &Value::from(id),
        None,
    )
}
