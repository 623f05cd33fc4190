//! 유전체 메타데이터 레코드
//!
//! 사용자, 유전체, 샘플, 시퀀스 파일, 변이 파일 레코드 모델입니다.
//! 저장소는 레코드를 JSON 객체로 다루고, 핸들러는 이 타입들로 입력을 검증합니다.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identity::{Identity, Role};

/// 레코드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    User,
    Genome,
    Sample,
    SequenceFile,
    VariantFile,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::User,
        RecordKind::Genome,
        RecordKind::Sample,
        RecordKind::SequenceFile,
        RecordKind::VariantFile,
    ];

    /// 테이블 이름
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::User => "users",
            RecordKind::Genome => "genomes",
            RecordKind::Sample => "samples",
            RecordKind::SequenceFile => "sequence_files",
            RecordKind::VariantFile => "variant_files",
        }
    }

    /// 응답 메시지용 이름
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::User => "User",
            RecordKind::Genome => "Genome",
            RecordKind::Sample => "Sample",
            RecordKind::SequenceFile => "Sequence file",
            RecordKind::VariantFile => "Variant",
        }
    }

    /// 쓰기 가능한 컬럼 (id, 생성 시각 제외)
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::User => &["email", "password_hash", "role"],
            RecordKind::Genome => &["name", "species", "reference_version", "created_by"],
            RecordKind::Sample => &[
                "genome_id",
                "donor_id",
                "collection_date",
                "sample_type",
                "metadata",
                "collected_by",
            ],
            RecordKind::SequenceFile => &[
                "sample_id",
                "file_path",
                "file_type",
                "checksum",
                "uploaded_by",
            ],
            RecordKind::VariantFile => &[
                "sample_id",
                "genome_id",
                "file_path",
                "file_type",
                "checksum",
                "uploaded_by",
            ],
        }
    }

    /// 저장 시 자동으로 채워지는 시각 컬럼
    pub fn timestamp_column(&self) -> &'static str {
        match self {
            RecordKind::SequenceFile | RecordKind::VariantFile => "uploaded_at",
            _ => "created_at",
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns().contains(&name)
    }
}

/// API로 다루는 레코드
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: RecordKind;

    /// 저장 전 입력 검증
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// 작성자 필드가 비어 있으면 인증된 사용자로 채움
    fn attribute_to(&mut self, _user_id: i64) {}
}

/// 기존 레코드 위에 부분 수정 내용을 덮어씀
///
/// `id`와 생성 시각은 덮어쓰지 않습니다.
pub fn merge_patch(kind: RecordKind, existing: Value, patch: Value) -> Result<Value> {
    let Value::Object(patch) = patch else {
        return Err(Error::validation("request body must be a JSON object"));
    };
    let Value::Object(mut merged) = existing else {
        return Err(Error::internal(format!(
            "stored {} is not a JSON object",
            kind.table()
        )));
    };

    for (key, value) in patch {
        if key == "id" || key == kind.timestamp_column() {
            continue;
        }
        merged.insert(key, value);
    }

    Ok(Value::Object(merged))
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_positive(value: i64, field: &str) -> Result<()> {
    if value <= 0 {
        return Err(Error::validation(format!("{} must be a positive id", field)));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    require_non_empty(email, "email")?;
    if !email.contains('@') {
        return Err(Error::validation("email must contain '@'"));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// 사용자 레코드
///
/// 비밀번호 해시는 응답에 직렬화되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,

    pub email: String,

    #[serde(default, skip_serializing)]
    pub password_hash: String,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for User {
    const KIND: RecordKind = RecordKind::User;

    fn validate(&self) -> Result<()> {
        validate_email(&self.email)
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: user.created_at.unwrap_or_default(),
        }
    }
}

/// 사용자 생성 요청
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,

    #[serde(alias = "secret")]
    pub password: String,

    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(Error::validation("password must not be empty"));
        }
        Ok(())
    }
}

/// 사용자 수정 요청
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, alias = "secret")]
    pub password: Option<String>,

    #[serde(default)]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if matches!(self.password.as_deref(), Some("")) {
            return Err(Error::validation("password must not be empty"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Genomes / Samples
// ─────────────────────────────────────────────────────────────────────────────

/// 참조 유전체
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    #[serde(default)]
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub species: String,

    #[serde(default)]
    pub reference_version: String,

    #[serde(default)]
    pub created_by: Option<i64>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Genome {
    const KIND: RecordKind = RecordKind::Genome;

    fn validate(&self) -> Result<()> {
        require_non_empty(&self.name, "name")
    }

    fn attribute_to(&mut self, user_id: i64) {
        self.created_by.get_or_insert(user_id);
    }
}

/// 채취 샘플
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub id: i64,

    pub genome_id: i64,

    #[serde(default)]
    pub donor_id: String,

    #[serde(default)]
    pub collection_date: String,

    #[serde(default)]
    pub sample_type: String,

    /// 자유 형식 메타데이터
    #[serde(default)]
    pub metadata: Option<Value>,

    #[serde(default)]
    pub collected_by: Option<i64>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Sample {
    const KIND: RecordKind = RecordKind::Sample;

    fn validate(&self) -> Result<()> {
        require_positive(self.genome_id, "genome_id")
    }

    fn attribute_to(&mut self, user_id: i64) {
        self.collected_by.get_or_insert(user_id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// 시퀀스 파일 (FASTQ, BAM 등)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceFile {
    #[serde(default)]
    pub id: i64,

    pub sample_id: i64,

    pub file_path: String,

    #[serde(default)]
    pub file_type: String,

    #[serde(default)]
    pub checksum: String,

    #[serde(default)]
    pub uploaded_by: Option<i64>,

    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Record for SequenceFile {
    const KIND: RecordKind = RecordKind::SequenceFile;

    fn validate(&self) -> Result<()> {
        require_positive(self.sample_id, "sample_id")?;
        require_non_empty(&self.file_path, "file_path")
    }

    fn attribute_to(&mut self, user_id: i64) {
        self.uploaded_by.get_or_insert(user_id);
    }
}

/// 변이 파일 (VCF 등)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantFile {
    #[serde(default)]
    pub id: i64,

    pub sample_id: i64,

    pub genome_id: i64,

    pub file_path: String,

    #[serde(default)]
    pub file_type: String,

    #[serde(default)]
    pub checksum: String,

    #[serde(default)]
    pub uploaded_by: Option<i64>,

    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Record for VariantFile {
    const KIND: RecordKind = RecordKind::VariantFile;

    fn validate(&self) -> Result<()> {
        require_positive(self.sample_id, "sample_id")?;
        require_positive(self.genome_id, "genome_id")?;
        require_non_empty(&self.file_path, "file_path")
    }

    fn attribute_to(&mut self, user_id: i64) {
        self.uploaded_by.get_or_insert(user_id);
    }
}
