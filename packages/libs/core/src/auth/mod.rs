//! 인증 관련 타입 및 로직
//!
//! # 개요
//!
//! GenoVault의 인증은 두 단계로 이루어집니다:
//!
//! - **로그인**: `CredentialVerifier`가 이메일/비밀번호를 저장된 해시와 대조
//! - **게이트**: `TokenService`가 로그인 시 발급한 토큰을 매 요청마다 검증
//!
//! # 토큰
//!
//! - **Access Token**: HS256 JWT (sub, email, iat, exp)
//! - 서버는 토큰을 저장하지 않으며, 만료 외의 폐기 수단은 없습니다.

mod claims;
mod credential;
mod errors;
mod password;
mod token;

pub use claims::TokenClaims;
pub use credential::{Credential, CredentialVerifier};
pub use errors::{AuthError, TokenError};
pub use password::PasswordService;
pub use token::{bearer_token, AuthenticatedIdentity, IssuedToken, SigningSecret, TokenService};
