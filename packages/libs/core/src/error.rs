//! 공통 에러 타입
//!
//! GenoVault 전체에서 사용되는 에러 타입을 정의합니다.
//! 인증 관련 실패는 내부적으로 구분되지만, 클라이언트에는 하나의 메시지로 합쳐서 노출합니다.

use thiserror::Error;

use crate::auth::{AuthError, TokenError};

pub type Result<T> = std::result::Result<T, Error>;

/// GenoVault 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Request Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("validation error: {message}")]
    Validation { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("token rejected: {0}")]
    Token(#[from] TokenError),

    // ─────────────────────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("internal error: {message}")]
    Internal { message: String },

    #[error("identity store error: {message}")]
    Store { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Validation { .. } | Error::Json(_) => 400,

            // 401 Unauthorized
            Error::Auth(_) | Error::Token(_) => 401,

            // 500 Internal Server Error
            Error::Internal { .. } | Error::Store { .. } => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Auth(_) => "INVALID_CREDENTIALS",
            Error::Token(_) => "INVALID_TOKEN",
            Error::Internal { .. } | Error::Store { .. } => "INTERNAL_ERROR",
        }
    }

    /// 클라이언트에 노출할 메시지
    ///
    /// 인증/토큰 실패의 세부 사유와 내부 장애 내용은 숨깁니다.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation { message } => message.clone(),
            Error::Json(e) => e.to_string(),
            Error::Auth(_) => "invalid credentials".to_string(),
            Error::Token(_) => "invalid or missing token".to_string(),
            Error::Internal { .. } | Error::Store { .. } => "internal server error".to_string(),
        }
    }
}
