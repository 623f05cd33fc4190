//! 레코드 저장소
//!
//! 레코드는 종류(`RecordKind`)별 테이블에 JSON 객체로 저장됩니다.
//! - `PgStore`: PostgreSQL (운영)
//! - `MemoryStore`: 프로세스 메모리 (개발/테스트)

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde_json::Value;

use gv_core::identity::IdentityStore;
use gv_core::records::RecordKind;

use crate::error::Result;

/// 레코드 저장소
///
/// 입력 객체에서 `RecordKind::columns()`에 없는 필드는 무시합니다.
/// `id`와 생성 시각은 저장소가 채웁니다.
#[async_trait]
pub trait RecordStore: IdentityStore {
    /// 전체 조회 (id 오름차순)
    async fn list(&self, kind: RecordKind) -> Result<Vec<Value>>;

    /// 정수 컬럼 값으로 필터링한 조회 (id 오름차순)
    async fn list_by(&self, kind: RecordKind, column: &str, value: i64) -> Result<Vec<Value>>;

    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Value>>;

    /// 새 레코드 저장 후 저장된 레코드 반환
    async fn insert(&self, kind: RecordKind, record: Value) -> Result<Value>;

    /// 입력 객체에 있는 컬럼만 덮어씀 (없으면 None)
    async fn update(&self, kind: RecordKind, id: i64, record: Value) -> Result<Option<Value>>;

    /// 삭제 (삭제된 행이 있으면 true)
    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool>;
}
