//! 인메모리 레코드 저장소
//!
//! `GV_DATABASE_URL`이 없을 때 사용합니다. 프로세스가 끝나면 데이터도 사라집니다.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use gv_core::identity::{Identity, IdentityStore};
use gv_core::records::{RecordKind, User};

use super::RecordStore;
use crate::error::{ApiError, Result};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
}

/// 인메모리 저장소
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<RecordKind, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 쓰기 가능한 컬럼만 남김
fn writable_fields(kind: RecordKind, record: Value) -> Result<Map<String, Value>> {
    let Value::Object(fields) = record else {
        return Err(ApiError::bad_request("request body must be a JSON object"));
    };

    Ok(fields
        .into_iter()
        .filter(|(key, _)| kind.has_column(key))
        .collect())
}

fn ensure_unique_email(table: &Table, fields: &Map<String, Value>, except: Option<i64>) -> Result<()> {
    let Some(email) = fields.get("email") else {
        return Ok(());
    };

    let taken = table
        .rows
        .iter()
        .any(|(id, row)| Some(*id) != except && row.get("email") == Some(email));
    if taken {
        return Err(ApiError::Conflict {
            message: "email already registered".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> gv_core::Result<Option<Identity>> {
        let tables = self.tables.read().await;
        let Some(users) = tables.get(&RecordKind::User) else {
            return Ok(None);
        };

        let row = users
            .rows
            .values()
            .find(|row| row.get("email").and_then(Value::as_str) == Some(email));

        match row {
            Some(row) => {
                let user: User = serde_json::from_value(Value::Object(row.clone()))
                    .map_err(|e| gv_core::Error::Store {
                        message: format!("corrupt user row: {}", e),
                    })?;
                Ok(Some(user.into()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, kind: RecordKind) -> Result<Vec<Value>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .map(|table| {
                table
                    .rows
                    .values()
                    .map(|row| Value::Object(row.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_by(&self, kind: RecordKind, column: &str, value: i64) -> Result<Vec<Value>> {
        if !kind.has_column(column) {
            return Err(ApiError::bad_request(format!(
                "unknown column {} for {}",
                column,
                kind.table()
            )));
        }

        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter(|row| row.get(column).and_then(Value::as_i64) == Some(value))
                    .map(|row| Value::Object(row.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Value>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .and_then(|table| table.rows.get(&id))
            .map(|row| Value::Object(row.clone())))
    }

    async fn insert(&self, kind: RecordKind, record: Value) -> Result<Value> {
        let mut fields = writable_fields(kind, record)?;

        let mut tables = self.tables.write().await;
        let table = tables.entry(kind).or_default();
        if kind == RecordKind::User {
            ensure_unique_email(table, &fields, None)?;
        }

        table.next_id += 1;
        let id = table.next_id;
        fields.insert("id".to_string(), Value::from(id));
        fields.insert(
            kind.timestamp_column().to_string(),
            serde_json::to_value(Utc::now())?,
        );

        table.rows.insert(id, fields.clone());
        Ok(Value::Object(fields))
    }

    async fn update(&self, kind: RecordKind, id: i64, record: Value) -> Result<Option<Value>> {
        let fields = writable_fields(kind, record)?;

        let mut tables = self.tables.write().await;
        let table = tables.entry(kind).or_default();
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if kind == RecordKind::User {
            ensure_unique_email(table, &fields, Some(id))?;
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.extend(fields);
        Ok(Some(Value::Object(row.clone())))
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .get_mut(&kind)
            .map(|table| table.rows.remove(&id).is_some())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let first = store
            .insert(RecordKind::Genome, json!({ "name": "GRCh38", "id": 77, "bogus": 1 }))
            .await
            .unwrap();
        let second = store
            .insert(RecordKind::Genome, json!({ "name": "GRCm39" }))
            .await
            .unwrap();

        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert!(first.get("bogus").is_none());
        assert!(first["created_at"].is_string());
        assert_eq!(store.list(RecordKind::Genome).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_timestamp() {
        let store = MemoryStore::new();
        let created = store
            .insert(RecordKind::Genome, json!({ "name": "GRCh37" }))
            .await
            .unwrap();

        let updated = store
            .update(
                RecordKind::Genome,
                1,
                json!({ "id": 5, "name": "GRCh38", "created_at": "1999-01-01T00:00:00Z" }),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["id"], 1);
        assert_eq!(updated["name"], "GRCh38");
        assert_eq!(updated["created_at"], created["created_at"]);
        assert!(store
            .update(RecordKind::Genome, 9, json!({ "name": "x" }))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_match() {
        let store = MemoryStore::new();
        store
            .insert(RecordKind::Sample, json!({ "genome_id": 1 }))
            .await
            .unwrap();

        assert!(store.delete(RecordKind::Sample, 1).await.unwrap());
        assert!(!store.delete(RecordKind::Sample, 1).await.unwrap());
        assert!(store.get(RecordKind::Sample, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_filters_on_column() {
        let store = MemoryStore::new();
        for sample_id in [1, 2, 1] {
            store
                .insert(
                    RecordKind::VariantFile,
                    json!({ "sample_id": sample_id, "genome_id": 1, "file_path": "/v.vcf" }),
                )
                .await
                .unwrap();
        }

        let hits = store
            .list_by(RecordKind::VariantFile, "sample_id", 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(store
            .list_by(RecordKind::VariantFile, "password_hash", 1)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_user_email_unique_and_lookup() {
        let store = MemoryStore::new();
        store
            .insert(
                RecordKind::User,
                json!({ "email": "a@x.com", "password_hash": "$argon2id$x", "role": "admin" }),
            )
            .await
            .unwrap();

        let err = store
            .insert(RecordKind::User, json!({ "email": "a@x.com", "password_hash": "h" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { .. }));

        let identity = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(identity.id, 1);
        assert_eq!(identity.password_hash, "$argon2id$x");
        assert!(store.find_by_email("A@X.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_object_rejected() {
        let store = MemoryStore::new();
        let err = store
            .insert(RecordKind::Genome, json!("GRCh38"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }
}
