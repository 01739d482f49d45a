//! PostgreSQL implementation of the record source.

use async_trait::async_trait;
use clinic_search_shared::IndexName;
use serde_json::Value;
use sqlx::Row;

use super::projections::{escape_like, projection_for, Projection};
use crate::errors::RecordSourceError;
use crate::interfaces::{RecordSource, RecordSources};
use crate::types::SyncDocument;

/// Reads one index's records from PostgreSQL.
///
/// Paging is `LIMIT/OFFSET` ordered by primary key, so a stable table yields every
/// row exactly once across a full run.
pub struct PostgresRecordSource {
    pool: sqlx::PgPool,
    projection: Projection,
}

impl PostgresRecordSource {
    /// Creates a record source for `index` over an existing pool.
    ///
    /// The pool must point at a database with the clinic tables from
    /// `src/postgres/migrations`.
    pub fn new(pool: sqlx::PgPool, index: IndexName) -> Self {
        Self {
            pool,
            projection: projection_for(index),
        }
    }

    /// A registry with a PostgreSQL source for every known index.
    pub fn registry(pool: &sqlx::PgPool) -> RecordSources {
        IndexName::ALL
            .into_iter()
            .fold(RecordSources::new(), |sources, index| {
                sources.with(
                    index,
                    std::sync::Arc::new(PostgresRecordSource::new(pool.clone(), index)),
                )
            })
    }
}

#[async_trait]
impl RecordSource for PostgresRecordSource {
    async fn count(&self) -> Result<u64, RecordSourceError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", self.projection.table);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_batch(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<SyncDocument>, RecordSourceError> {
        let sql = format!(
            "{} ORDER BY {} LIMIT $1 OFFSET $2",
            self.projection.select, self.projection.order_by
        );
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let body: Value = row.try_get("body")?;
                if !body.is_object() {
                    return Err(RecordSourceError::Decode {
                        id,
                        message: "projection is not an object".to_string(),
                    });
                }
                Ok(SyncDocument::new(id, body))
            })
            .collect()
    }

    async fn find_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, RecordSourceError> {
        let sql = format!(
            "SELECT DISTINCT ({expr}) COLLATE \"C\" AS value FROM {from} \
             WHERE {expr} LIKE $1 ESCAPE '\\' ORDER BY value LIMIT $2",
            expr = self.projection.prefix_expr,
            from = self.projection.prefix_from,
        );
        let rows = sqlx::query(&sql)
            .bind(format!("{}%", escape_like(prefix)))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("value").map_err(Into::into))
            .collect()
    }
}
