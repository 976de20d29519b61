//! Idempotent DDL derived from the entity definitions: one table per entity with
//! UNIQUE, CHECK and FOREIGN KEY constraints, plus an index per foreign key column.
//! Tables are created in dependency order (referenced tables first).

use crate::config::{EntityDef, Rule};
use crate::entities;
use crate::error::AppError;
use crate::sql::quoted;
use sqlx::PgPool;

/// Create every entity table and index that does not exist yet.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for entity in entities::all() {
        for sql in entity_ddl(entity) {
            tracing::debug!(%sql, "migration");
            sqlx::query(&sql).execute(pool).await?;
        }
        tracing::info!(table = entity.table, "table ready");
    }
    Ok(())
}

/// CREATE TABLE plus CREATE INDEX statements for one entity.
pub fn entity_ddl(entity: &EntityDef) -> Vec<String> {
    let mut defs: Vec<String> = vec![format!("{} BIGSERIAL PRIMARY KEY", quoted("id"))];
    for c in entity.columns {
        defs.push(format!("{} {} NOT NULL", quoted(c.name), c.kind.ddl_type()));
    }
    for ts in ["created_at", "updated_at"] {
        defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted(ts)));
    }

    let mut indexes = Vec::new();
    for field in entity.create_rules {
        let col = quoted(field.field);
        for rule in field.rules {
            match *rule {
                Rule::Unique { table, column } if table == entity.table => defs.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    quoted(&constraint_name(entity, column, "unique")),
                    quoted(column)
                )),
                Rule::Exists { table, column } => {
                    defs.push(format!(
                        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE CASCADE ON DELETE RESTRICT",
                        quoted(&constraint_name(entity, field.field, "foreign")),
                        col,
                        quoted(table),
                        quoted(column)
                    ));
                    indexes.push(format!(
                        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                        quoted(&constraint_name(entity, field.field, "index")),
                        quoted(entity.table),
                        col
                    ));
                }
                Rule::Between(lo, hi) => defs.push(format!(
                    "CONSTRAINT {} CHECK ({} BETWEEN {} AND {})",
                    quoted(&constraint_name(entity, field.field, "check")),
                    col,
                    lo,
                    hi
                )),
                Rule::Min(min) => defs.push(format!(
                    "CONSTRAINT {} CHECK ({} >= {})",
                    quoted(&constraint_name(entity, field.field, "check")),
                    col,
                    min
                )),
                _ => {}
            }
        }
    }

    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(entity.table),
        defs.join(",\n  ")
    )];
    statements.extend(indexes);
    statements
}

/// `{table}_{column}_{suffix}`; write errors are mapped back to fields through this shape.
fn constraint_name(entity: &EntityDef, column: &str, suffix: &str) -> String {
    format!("{}_{}_{}", entity.table, column, suffix)
}
