//! 토큰 Claims
//!
//! Access Token의 페이로드 구조입니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::TokenError;
use crate::identity::Identity;

/// Access Token Claims (JWT 페이로드)
///
/// 시각 필드는 모두 unix 초 단위입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (사용자 ID, 10진 문자열)
    pub sub: String,

    /// 사용자 이메일
    pub email: String,

    /// 발급 시각
    pub iat: i64,

    /// 만료 시각
    pub exp: i64,
}

impl TokenClaims {
    /// 새 claims 생성
    pub fn new(identity: &Identity, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// 만료 여부 확인
    ///
    /// 만료 시각과 같은 순간부터 만료로 취급합니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// 만료 시각
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// 남은 TTL (초)
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp()).max(0)
    }

    /// Subject를 사용자 ID로 해석
    pub fn subject_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Malformed)
    }
}
