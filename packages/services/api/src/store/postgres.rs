//! PostgreSQL 레코드 저장소
//!
//! 레코드는 `row_to_json`으로 읽고 `jsonb_populate_record`로 씁니다.
//! 컬럼 이름은 `RecordKind::columns()` 화이트리스트에서만 가져옵니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;

use gv_core::identity::{Identity, IdentityStore, Role};
use gv_core::records::RecordKind;

use super::RecordStore;
use crate::error::{ApiError, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn new(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL DEFAULT '',
                role TEXT NOT NULL DEFAULT 'guest',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"#,
            r#"CREATE TABLE IF NOT EXISTS genomes (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                species TEXT NOT NULL DEFAULT '',
                reference_version TEXT NOT NULL DEFAULT '',
                created_by BIGINT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"#,
            r#"CREATE TABLE IF NOT EXISTS samples (
                id BIGSERIAL PRIMARY KEY,
                genome_id BIGINT NOT NULL,
                donor_id TEXT NOT NULL DEFAULT '',
                collection_date TEXT NOT NULL DEFAULT '',
                sample_type TEXT NOT NULL DEFAULT '',
                metadata JSONB,
                collected_by BIGINT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"#,
            r#"CREATE TABLE IF NOT EXISTS sequence_files (
                id BIGSERIAL PRIMARY KEY,
                sample_id BIGINT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL DEFAULT '',
                checksum TEXT NOT NULL DEFAULT '',
                uploaded_by BIGINT,
                uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"#,
            r#"CREATE TABLE IF NOT EXISTS variant_files (
                id BIGSERIAL PRIMARY KEY,
                sample_id BIGINT NOT NULL,
                genome_id BIGINT NOT NULL,
                file_path TEXT NOT NULL,
                file_type TEXT NOT NULL DEFAULT '',
                checksum TEXT NOT NULL DEFAULT '',
                uploaded_by BIGINT,
                uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );"#,
            "CREATE INDEX IF NOT EXISTS variant_files_sample_id_idx ON variant_files (sample_id);",
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }

        Ok(())
    }
}

/// 입력 객체에 있는 쓰기 가능한 컬럼
fn present_columns(kind: RecordKind, record: &Value) -> Result<Vec<&'static str>> {
    let Value::Object(fields) = record else {
        return Err(ApiError::bad_request("request body must be a JSON object"));
    };

    Ok(kind
        .columns()
        .iter()
        .copied()
        .filter(|column| fields.contains_key(*column))
        .collect())
}

/// 제약 조건 위반을 클라이언트 에러로 변환
fn map_db_error(kind: RecordKind, err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23505") if kind == RecordKind::User => {
                return ApiError::Conflict {
                    message: "email already registered".to_string(),
                };
            }
            Some("23505") => {
                return ApiError::Conflict {
                    message: format!("duplicate {} record", kind.label()),
                };
            }
            // not_null_violation, invalid_text_representation, datetime/number format
            Some("23502") | Some("22P02") | Some("22007") | Some("22003") => {
                return ApiError::bad_request(db.message().to_string());
            }
            _ => {}
        }
    }
    ApiError::Database(err)
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        let role = row.role.parse::<Role>().unwrap_or_else(|_| {
            tracing::warn!(user_id = row.id, role = %row.role, "Unknown role in users table");
            Role::default()
        });

        Identity {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_by_email(&self, email: &str) -> gv_core::Result<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| gv_core::Error::Store {
            message: e.to_string(),
        })?;

        Ok(row.map(Identity::from))
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list(&self, kind: RecordKind) -> Result<Vec<Value>> {
        let sql = format!(
            "SELECT row_to_json(t.*) FROM {} AS t ORDER BY t.id",
            kind.table()
        );
        let rows = sqlx::query_scalar::<_, Value>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by(&self, kind: RecordKind, column: &str, value: i64) -> Result<Vec<Value>> {
        let Some(column) = kind.columns().iter().find(|c| **c == column) else {
            return Err(ApiError::bad_request(format!(
                "unknown column {} for {}",
                column,
                kind.table()
            )));
        };

        let sql = format!(
            "SELECT row_to_json(t.*) FROM {} AS t WHERE t.{} = $1 ORDER BY t.id",
            kind.table(),
            column
        );
        let rows = sqlx::query_scalar::<_, Value>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Value>> {
        let sql = format!(
            "SELECT row_to_json(t.*) FROM {} AS t WHERE t.id = $1",
            kind.table()
        );
        let row = sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, kind: RecordKind, record: Value) -> Result<Value> {
        let columns = present_columns(kind, &record)?;
        let table = kind.table();

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {table} AS t DEFAULT VALUES RETURNING row_to_json(t.*)"
            )
        } else {
            let list = columns.join(", ");
            format!(
                "INSERT INTO {table} AS t ({list}) \
                 SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING row_to_json(t.*)"
            )
        };

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        if !columns.is_empty() {
            query = query.bind(Json(record));
        }

        query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(kind, e))
    }

    async fn update(&self, kind: RecordKind, id: i64, record: Value) -> Result<Option<Value>> {
        let columns = present_columns(kind, &record)?;
        if columns.is_empty() {
            return self.get(kind, id).await;
        }

        let table = kind.table();
        let list = columns.join(", ");
        let sql = format!(
            "UPDATE {table} AS t SET ({list}) = \
             (SELECT {list} FROM jsonb_populate_record(NULL::{table}, $2)) \
             WHERE t.id = $1 RETURNING row_to_json(t.*)"
        );

        sqlx::query_scalar::<_, Value>(&sql)
            .bind(id)
            .bind(Json(record))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(kind, e))
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_present_columns_follow_whitelist_order() {
        let record = json!({
            "file_path": "/a.vcf",
            "sample_id": 1,
            "id": 4,
            "uploaded_at": "2024-01-01T00:00:00Z",
            "evil; DROP TABLE users": 1
        });

        let columns = present_columns(RecordKind::VariantFile, &record).unwrap();
        assert_eq!(columns, vec!["sample_id", "file_path"]);
    }

    #[test]
    fn test_present_columns_requires_object() {
        assert!(present_columns(RecordKind::Genome, &json!([1])).is_err());
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_db_error(RecordKind::User, sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::Database(_)));
    }
}
