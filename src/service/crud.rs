//! Generic CRUD execution against PostgreSQL.

use crate::config::EntityDef;
use crate::entities::Entity;
use crate::error::{AppError, ValidationErrors};
use crate::sql::{count, delete, dependents_exist, insert, select_by_id, select_page, update, Condition, PgBindValue, QueryBuf};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use std::marker::PhantomData;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// One page of rows plus the total matching the same filters.
#[derive(Debug)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: u64,
}

pub struct CrudService<E>(PhantomData<E>);

/// Run an `EXISTS(...)` query.
pub async fn query_exists(pool: &PgPool, q: &QueryBuf) -> Result<bool, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let found = bind_scalar::<bool>(sqlx::query_scalar(&q.sql), &q.params)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

impl<E: Entity> CrudService<E> {
    /// One page ordered by id, filtered by whitelisted conditions.
    pub async fn list(
        pool: &PgPool,
        conditions: &[Condition],
        page: u32,
        per_page: u32,
    ) -> Result<Page<E>, AppError> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(per_page);
        let cq = count(E::DEF, conditions);
        tracing::debug!(sql = %cq.sql, params = ?cq.params, "query");
        let total: i64 = bind_scalar(sqlx::query_scalar(&cq.sql), &cq.params)
            .fetch_one(pool)
            .await?;

        let q = select_page(E::DEF, conditions, per_page, offset);
        let items = Self::query_many(pool, &q).await?;
        Ok(Page {
            items,
            total: total.max(0) as u64,
        })
    }

    pub async fn find(pool: &PgPool, id: i64) -> Result<Option<E>, AppError> {
        let q = select_by_id(E::DEF, id);
        Self::query_optional(pool, &q).await
    }

    /// Insert validated fields. Returns the created row.
    pub async fn create(pool: &PgPool, body: &HashMap<String, Value>) -> Result<E, AppError> {
        let q = insert(E::DEF, body);
        Self::query_optional(pool, &q)
            .await
            .map_err(|e| map_write_error(E::DEF, e))?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update present fields only. None when the row vanished in between.
    pub async fn update(pool: &PgPool, id: i64, body: &HashMap<String, Value>) -> Result<Option<E>, AppError> {
        let q = update(E::DEF, id, body);
        Self::query_optional(pool, &q)
            .await
            .map_err(|e| map_write_error(E::DEF, e))
    }

    /// Delete by id. Refuses with Conflict while dependent rows exist. Returns false if absent.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        for dependent in E::DEF.dependents {
            if query_exists(pool, &dependents_exist(dependent, id)).await? {
                return Err(AppError::Conflict(dependent.message.to_string()));
            }
        }
        let q = delete(E::DEF, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let deleted: Option<i64> = bind_scalar(sqlx::query_scalar(&q.sql), &q.params)
            .fetch_optional(pool)
            .await
            .map_err(|e| map_write_error(E::DEF, AppError::Db(e)))?;
        Ok(deleted.is_some())
    }

    async fn query_optional(pool: &PgPool, q: &QueryBuf) -> Result<Option<E>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_as::<E>(sqlx::query_as(&q.sql), &q.params)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<E>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_as::<E>(sqlx::query_as(&q.sql), &q.params)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}

fn bind_as<'q, E>(
    mut query: QueryAs<'q, Postgres, E, PgArguments>,
    params: &[Value],
) -> QueryAs<'q, Postgres, E, PgArguments> {
    for p in params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[Value],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for p in params {
        query = query.bind(PgBindValue::from_json(p));
    }
    query
}

/// Constraint violations that slipped past the application checks (concurrent writers).
/// Constraint names follow `{table}_{column}_unique` / `{table}_{column}_foreign`.
pub fn map_write_error(entity: &EntityDef, err: AppError) -> AppError {
    let AppError::Db(sqlx::Error::Database(db)) = &err else {
        return err;
    };
    let code = db.code().map(|c| c.to_string()).unwrap_or_default();
    let constraint = db.constraint().unwrap_or_default().to_string();
    let column = constraint
        .strip_prefix(entity.table)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix("_unique").or_else(|| rest.strip_suffix("_foreign")));
    match code.as_str() {
        UNIQUE_VIOLATION => match column {
            Some(col) => AppError::Validation(ValidationErrors::single(
                col,
                format!("The {} has already been taken.", col.replace('_', " ")),
            )),
            None => AppError::Conflict("Duplicate record".to_string()),
        },
        FOREIGN_KEY_VIOLATION => match column {
            // Our own FK column: the referenced row is gone.
            Some(col) => AppError::Validation(ValidationErrors::single(
                col,
                format!("The selected {} is invalid.", col.replace('_', " ")),
            )),
            // Another table's FK pointing at us: deletion blocked.
            None => AppError::Conflict(
                entity
                    .dependents
                    .first()
                    .map(|d| d.message.to_string())
                    .unwrap_or_else(|| "Record is still referenced".to_string()),
            ),
        },
        _ => err,
    }
}
