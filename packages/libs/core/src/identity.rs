//! 사용자 식별 정보
//!
//! 로그인 시 조회되는 사용자 레코드와 조회 인터페이스입니다.
//! 코어는 이 정보를 읽기만 하며, 저장과 변경은 저장소 구현체가 담당합니다.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 사용자 Role
///
/// 현재 접근 제어에는 사용되지 않는 정보성 태그입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Researcher,
    #[default]
    Guest,
    LabTechnician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Researcher => "researcher",
            Role::Guest => "guest",
            Role::LabTechnician => "lab_technician",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "researcher" => Ok(Role::Researcher),
            "guest" => Ok(Role::Guest),
            "lab_technician" => Ok(Role::LabTechnician),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// 저장소에 기록된 사용자 식별 정보
#[derive(Clone)]
pub struct Identity {
    /// 사용자 ID
    pub id: i64,

    /// 이메일 (로그인 키, 대소문자 구분)
    pub email: String,

    /// 비밀번호 해시 (PHC 문자열)
    pub password_hash: String,

    /// Role
    pub role: Role,

    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// 사용자 조회 인터페이스
///
/// 이메일 정확 일치로 최대 한 명의 사용자를 반환합니다.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;
}

#[async_trait]
impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        (**self).find_by_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in [
            Role::Admin,
            Role::Researcher,
            Role::Guest,
            Role::LabTechnician,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Guest);
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::LabTechnician).unwrap();
        assert_eq!(json, "\"lab_technician\"");
    }

    #[test]
    fn test_identity_debug_redacts_hash() {
        let identity = Identity {
            id: 7,
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            role: Role::Researcher,
            created_at: Utc::now(),
        };

        let debug = format!("{:?}", identity);
        assert!(debug.contains("a@x.com"));
        assert!(!debug.contains("argon2id"));
    }
}
