//! 인증 실패 사유
//!
//! 내부 로그에서는 구분하고, 응답에서는 `Error::public_message`로 합칩니다.

use thiserror::Error;

/// 로그인 실패 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no identity registered for this email")]
    UnknownIdentity,

    #[error("secret does not match stored credential")]
    BadCredential,
}

impl AuthError {
    /// 로그 필드용 사유 문자열
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::UnknownIdentity => "unknown_identity",
            AuthError::BadCredential => "bad_credential",
        }
    }
}

/// 토큰 검증 실패 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("no bearer token presented")]
    Missing,

    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

impl TokenError {
    /// 로그 필드용 사유 문자열
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Missing => "missing",
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}
