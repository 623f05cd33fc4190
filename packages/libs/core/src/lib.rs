//! gv-core: GenoVault 공통 핵심 라이브러리
//!
//! API 서비스가 사용하는 인증 게이트와 레코드 모델을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: 자격 증명 검증, 비밀번호 해시, 토큰 발급/검증
//! - `identity`: 사용자 식별 정보와 조회 인터페이스
//! - `records`: 유전체 메타데이터 레코드 모델
//! - `error`: 공통 에러 타입

pub mod auth;
pub mod error;
pub mod identity;
pub mod records;

pub use error::{Error, Result};
