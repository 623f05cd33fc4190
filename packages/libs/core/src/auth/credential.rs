//! 로그인 자격 증명 검증
//!
//! 이메일로 사용자를 조회하고, 입력된 비밀번호를 저장된 해시와 대조합니다.
//! 조회 외의 부수 효과는 없습니다.

use std::fmt;

use super::password::PasswordService;
use super::AuthError;
use crate::error::{Error, Result};
use crate::identity::{Identity, IdentityStore};

/// 로그인 입력 (이메일 + 평문 비밀번호)
#[derive(Clone)]
pub struct Credential {
    email: String,
    secret: String,
}

impl Credential {
    /// 입력 검증 후 생성
    ///
    /// 두 필드 모두 비어 있으면 안 됩니다. 저장소 조회 전에 실패합니다.
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let email = email.into();
        let secret = secret.into();

        if email.trim().is_empty() {
            return Err(Error::validation("email must not be empty"));
        }
        if secret.is_empty() {
            return Err(Error::validation("secret must not be empty"));
        }

        Ok(Self { email, secret })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// 자격 증명 검증기
pub struct CredentialVerifier<S> {
    store: S,
    passwords: PasswordService,
    decoy_hash: String,
}

impl<S: IdentityStore> CredentialVerifier<S> {
    pub fn new(store: S, passwords: PasswordService) -> Result<Self> {
        // 없는 사용자도 해시 검증 한 번을 거치도록 미리 계산해 둔 값
        let decoy_hash = passwords.hash("genovault-decoy-credential")?;
        Ok(Self {
            store,
            passwords,
            decoy_hash,
        })
    }

    /// 자격 증명 검증
    ///
    /// - 이메일 불일치 → `AuthError::UnknownIdentity`
    /// - 비밀번호 불일치 → `AuthError::BadCredential`
    /// - 저장소 장애 → `Error::Store`
    pub async fn verify(&self, credential: &Credential) -> Result<Identity> {
        let Some(identity) = self.store.find_by_email(&credential.email).await? else {
            let _ = self.passwords.verify(&credential.secret, &self.decoy_hash);
            return Err(AuthError::UnknownIdentity.into());
        };

        if !self
            .passwords
            .verify(&credential.secret, &identity.password_hash)
        {
            return Err(AuthError::BadCredential.into());
        }

        Ok(identity)
    }
}
