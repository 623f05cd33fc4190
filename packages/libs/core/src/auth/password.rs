//! 비밀번호 해시
//!
//! 저장되는 자격 증명은 Argon2id PHC 문자열입니다.
//! 검증은 같은 파라미터로 재계산한 뒤 상수 시간 비교로 이루어집니다.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::error::{Error, Result};

/// Argon2id 해시/검증기
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordService {
    /// 파라미터 지정 생성 (m: KiB, t: 반복 횟수, p: 병렬도)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| Error::internal(format!("invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// 평문 비밀번호를 PHC 문자열로 해시
    pub fn hash(&self, secret: &str) -> Result<String> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::internal(format!("salt encoding failed: {}", e)))?;

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| Error::internal(format!("password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// 평문 비밀번호와 저장된 해시 대조
    ///
    /// 저장된 값이 PHC 문자열이 아니면 (예: 평문으로 저장된 레거시 값) 불일치로 취급합니다.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("stored credential is not a valid password hash");
                return false;
            }
        };

        self.argon2
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}
