//! 레코드 CRUD 핸들러
//!
//! 레코드 종류마다 같은 흐름을 쓰므로 `Record` 타입으로 일반화했습니다.
//! 모든 라우트는 토큰 게이트 뒤에 있습니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use gv_core::auth::AuthenticatedIdentity;
use gv_core::records::{merge_patch, Record, RecordKind, VariantFile};

use super::parse_id;
use crate::error::{ApiError, ApiJson, Result};
use crate::state::AppState;

/// 저장된 행을 레코드 타입으로 변환
pub(crate) fn decode<R: Record>(row: Value) -> Result<R> {
    serde_json::from_value(row).map_err(|e| {
        ApiError::internal(format!("stored {} row is invalid: {}", R::KIND.table(), e))
    })
}

pub(crate) fn not_found(kind: RecordKind) -> ApiError {
    ApiError::not_found(format!("{} not found", kind.label()))
}

pub async fn list<R: Record>(State(state): State<Arc<AppState>>) -> Result<Json<Vec<R>>> {
    let rows = state.store.list(R::KIND).await?;
    let records = rows.into_iter().map(decode::<R>).collect::<Result<Vec<_>>>()?;
    Ok(Json(records))
}

pub async fn get_one<R: Record>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<R>> {
    let id = parse_id(&id)?;
    let row = state
        .store
        .get(R::KIND, id)
        .await?
        .ok_or_else(|| not_found(R::KIND))?;

    Ok(Json(decode(row)?))
}

pub async fn create<R: Record>(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<R>)> {
    let mut record: R = serde_json::from_value(body)?;
    record.validate()?;
    record.attribute_to(identity.user_id);

    let row = state
        .store
        .insert(R::KIND, serde_json::to_value(&record)?)
        .await?;
    let stored: R = decode(row)?;

    tracing::debug!(kind = R::KIND.table(), user_id = identity.user_id, "Created record");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// 기존 레코드에 요청 본문을 덮어써서 저장
pub async fn update<R: Record>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<R>> {
    let id = parse_id(&id)?;
    let existing = state
        .store
        .get(R::KIND, id)
        .await?
        .ok_or_else(|| not_found(R::KIND))?;

    let record: R = serde_json::from_value(merge_patch(R::KIND, existing, body)?)?;
    record.validate()?;

    let row = state
        .store
        .update(R::KIND, id, serde_json::to_value(&record)?)
        .await?
        .ok_or_else(|| not_found(R::KIND))?;

    Ok(Json(decode(row)?))
}

/// 삭제 (일치하는 레코드가 없어도 200)
pub async fn delete<R: Record>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    let deleted = state.store.delete(R::KIND, id).await?;
    tracing::debug!(kind = R::KIND.table(), id, deleted, "Delete request handled");

    Ok(Json(json!({ "message": format!("{} deleted", R::KIND.label()) })))
}

/// 샘플에 연결된 변이 파일 조회
pub async fn list_sample_variants(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<VariantFile>>> {
    let sample_id = parse_id(&id)?;
    let rows = state
        .store
        .list_by(RecordKind::VariantFile, "sample_id", sample_id)
        .await?;
    let records = rows
        .into_iter()
        .map(decode::<VariantFile>)
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(records))
}
