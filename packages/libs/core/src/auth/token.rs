//! 토큰 발급 및 검증
//!
//! 로그인 성공 시 토큰을 발급하고, 보호된 요청마다 토큰을 검증하는 로직입니다.
//! 검증은 (토큰, 현재 시각, 서명 키)만으로 결정되며 서버 측 상태를 두지 않습니다.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use zeroize::Zeroize;

use super::claims::TokenClaims;
use super::TokenError;
use crate::error::{Error, Result};
use crate::identity::Identity;

/// `Authorization` 헤더에서 Bearer 토큰 추출
///
/// 헤더가 없으면 `Missing`, Bearer 형식이 아니면 `Malformed`입니다.
/// 스킴 이름은 대소문자를 구분하지 않습니다.
pub fn bearer_token(auth_header: Option<&str>) -> std::result::Result<&str, TokenError> {
    let value = auth_header.ok_or(TokenError::Missing)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(TokenError::Malformed)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenError::Malformed);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Malformed);
    }

    Ok(token)
}

/// 서명 키
///
/// 프로세스 시작 시 한 번 로드되어 발급과 검증에 공유됩니다.
/// 키를 교체하면 이전에 발급된 모든 토큰이 무효화됩니다.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// 설정 문자열에서 키 로드
    ///
    /// - `base64:<value>`: base64 (standard 또는 url-safe) 디코딩
    /// - `hex:<value>`: hex 디코딩
    /// - 그 외: 문자열 바이트 그대로 (앞뒤 공백 포함)
    ///
    /// 접두사가 붙은 인코딩 값만 앞뒤 공백을 제거하고 디코딩합니다.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        if let Some(encoded) = trimmed.strip_prefix("base64:") {
            let bytes = general_purpose::STANDARD
                .decode(encoded)
                .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(encoded))
                .map_err(|_| Error::validation("signing secret is not valid base64"))?;
            return Ok(Self(bytes));
        }

        if let Some(encoded) = trimmed.strip_prefix("hex:") {
            let bytes = decode_hex(encoded)
                .ok_or_else(|| Error::validation("signing secret is not valid hex"))?;
            return Ok(Self(bytes));
        }

        Ok(Self(raw.as_bytes().to_vec()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret(<{} bytes redacted>)", self.0.len())
    }
}

impl Drop for SigningSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 || !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut bytes = Vec::with_capacity(input.len() / 2);
    let mut chars = input.chars();
    while let (Some(h), Some(l)) = (chars.next(), chars.next()) {
        let hi = h.to_digit(16)?;
        let lo = l.to_digit(16)?;
        bytes.push(((hi << 4) | lo) as u8);
    }
    Some(bytes)
}

/// 발급된 토큰
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// 서명된 토큰 (URL-safe)
    pub token: String,

    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 인증된 주체
///
/// 토큰 검증 후 확정된 호출자 정보입니다. 하위 핸들러는 읽기 전용으로 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub user_id: i64,
    pub email: String,
}

/// 토큰 발급기 + 검증기
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    configured: bool,
}

impl TokenService {
    /// 기본 유효 기간 (24시간)
    pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 validate_at에서 주입된 시각으로 직접 판정
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            configured: !secret.is_empty(),
        }
    }

    /// 토큰 유효 기간
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 토큰 발급
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken> {
        self.issue_at(identity, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 발급
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken> {
        if !self.configured {
            return Err(Error::internal("signing secret is not configured"));
        }
        if self.ttl <= Duration::zero() {
            return Err(Error::internal("token validity window must be positive"));
        }

        let claims = TokenClaims::new(identity, now, self.ttl);
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| Error::internal("token expiry is out of range"))?;

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::internal(format!("token signing failed: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// 토큰 검증 및 주체 추출
    pub fn validate(&self, token: &str) -> std::result::Result<AuthenticatedIdentity, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 검증
    ///
    /// 구조 → 서명 → 만료 순서로 검사하며, 처음 실패한 단계의 사유를 반환합니다.
    pub fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<AuthenticatedIdentity, TokenError> {
        if !self.configured {
            return Err(TokenError::InvalidSignature);
        }

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(AuthenticatedIdentity {
            user_id: claims.subject_id()?,
            email: claims.email,
        })
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl.num_seconds())
            .field("configured", &self.configured)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn identity() -> Identity {
        Identity {
            id: 17,
            email: "a@x.com".to_string(),
            password_hash: String::new(),
            role: Role::Researcher,
            created_at: Utc::now(),
        }
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(
            &SigningSecret::new(secret),
            Duration::seconds(TokenService::DEFAULT_TTL_SECS),
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(None), Err(TokenError::Missing));
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(Some("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("Basic dXNlcjpwdw==")), Err(TokenError::Malformed));
        assert_eq!(bearer_token(Some("Bearer ")), Err(TokenError::Malformed));
        assert_eq!(bearer_token(Some("abc.def.ghi")), Err(TokenError::Malformed));
    }

    #[test]
    fn test_issue_then_validate_round_trip() {
        let tokens = service("process-secret");
        let issued = tokens.issue_at(&identity(), fixed_now()).unwrap();

        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(issued.expires_at, fixed_now() + Duration::hours(24));

        let authed = tokens.validate_at(&issued.token, fixed_now()).unwrap();
        assert_eq!(
            authed,
            AuthenticatedIdentity {
                user_id: 17,
                email: "a@x.com".to_string(),
            }
        );
    }

    #[test]
    fn test_validate_with_wall_clock() {
        let tokens = service("process-secret");
        let issued = tokens.issue(&identity()).unwrap();
        assert_eq!(tokens.validate(&issued.token).unwrap().user_id, 17);
    }

    #[test]
    fn test_validate_is_repeatable() {
        let tokens = service("process-secret");
        let issued = tokens.issue_at(&identity(), fixed_now()).unwrap();

        let first = tokens.validate_at(&issued.token, fixed_now()).unwrap();
        for _ in 0..5 {
            assert_eq!(tokens.validate_at(&issued.token, fixed_now()).unwrap(), first);
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = service("process-secret");
        let issued = tokens.issue_at(&identity(), fixed_now()).unwrap();

        let just_before = fixed_now() + Duration::hours(24) - Duration::seconds(1);
        assert!(tokens.validate_at(&issued.token, just_before).is_ok());

        let at_expiry = fixed_now() + Duration::hours(24);
        assert_eq!(
            tokens.validate_at(&issued.token, at_expiry),
            Err(TokenError::Expired)
        );

        let after = fixed_now() + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(tokens.validate_at(&issued.token, after), Err(TokenError::Expired));
    }

    #[test]
    fn test_any_signature_mutation_is_rejected() {
        let tokens = service("process-secret");
        let issued = tokens.issue_at(&identity(), fixed_now()).unwrap();
        let sig_start = issued.token.rfind('.').unwrap() + 1;

        for i in sig_start..issued.token.len() {
            let mut bytes = issued.token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let forged = String::from_utf8(bytes).unwrap();

            assert_eq!(
                tokens.validate_at(&forged, fixed_now()),
                Err(TokenError::InvalidSignature),
                "mutation at byte {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_payload_mutation_is_rejected() {
        let tokens = service("process-secret");
        let issued = tokens.issue_at(&identity(), fixed_now()).unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let other = Identity {
            id: 1,
            ..identity()
        };
        let other_token = tokens.issue_at(&other, fixed_now()).unwrap().token;
        let other_payload = other_token.split('.').nth(1).unwrap();

        let spliced = format!("{}.{}.{}", parts[0], other_payload, parts[2]);
        assert_eq!(
            tokens.validate_at(&spliced, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let ours = service("process-secret");
        let theirs = service("another-secret");
        let forged = theirs.issue_at(&identity(), fixed_now()).unwrap();

        assert_eq!(
            ours.validate_at(&forged.token, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let tokens = service("process-secret");
        let claims = TokenClaims::new(&identity(), fixed_now(), Duration::hours(1));
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"process-secret"),
        )
        .unwrap();

        assert_eq!(
            tokens.validate_at(&hs512, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let tokens = service("process-secret");

        for raw in ["", "abc", "a.b", "a.b.c", "!!!.???.###"] {
            assert_eq!(
                tokens.validate_at(raw, fixed_now()),
                Err(TokenError::Malformed),
                "{:?} was not reported as malformed",
                raw
            );
        }
    }

    #[test]
    fn test_missing_claims_are_malformed() {
        let tokens = service("process-secret");
        let key = EncodingKey::from_secret(b"process-secret");
        let header = Header::new(Algorithm::HS256);

        let no_exp = encode(&header, &serde_json::json!({ "sub": "17", "email": "a@x.com" }), &key)
            .unwrap();
        assert_eq!(tokens.validate_at(&no_exp, fixed_now()), Err(TokenError::Malformed));

        let bad_sub = encode(
            &header,
            &serde_json::json!({
                "sub": "not-a-number",
                "email": "a@x.com",
                "iat": fixed_now().timestamp(),
                "exp": fixed_now().timestamp() + 60,
            }),
            &key,
        )
        .unwrap();
        assert_eq!(tokens.validate_at(&bad_sub, fixed_now()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_empty_secret_cannot_sign_or_verify() {
        let tokens = service("");
        let err = tokens.issue_at(&identity(), fixed_now()).unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
        assert_eq!(err.status_code(), 500);

        let forged = service("x").issue_at(&identity(), fixed_now()).unwrap();
        assert_eq!(
            tokens.validate_at(&forged.token, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_secret_rotation_invalidates_tokens() {
        let before = service("key-v1");
        let issued = before.issue_at(&identity(), fixed_now()).unwrap();

        let after = service("key-v2");
        assert_eq!(
            after.validate_at(&issued.token, fixed_now()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_signing_secret_parse() {
        assert_eq!(SigningSecret::parse("plain-secret").unwrap().len(), 12);
        assert_eq!(SigningSecret::parse("base64:AAECAw==").unwrap().len(), 4);
        assert_eq!(SigningSecret::parse("hex:00ff10").unwrap().len(), 3);
        assert!(SigningSecret::parse("hex:abc").is_err());
        assert!(SigningSecret::parse("base64:***").is_err());
        assert!(SigningSecret::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_signing_secret_hex_rejects_non_ascii() {
        // 'é'는 UTF-8로 2바이트라 길이 검사만으로는 걸러지지 않음
        assert!(SigningSecret::parse("hex:aa\u{e9}").is_err());
        assert!(SigningSecret::parse("hex:zz").is_err());
        assert!(SigningSecret::parse("hex:+1").is_err());
    }

    #[test]
    fn test_plain_signing_secret_keeps_whitespace() {
        assert_eq!(SigningSecret::parse(" key ").unwrap().len(), 5);
        assert_eq!(SigningSecret::parse("key").unwrap().len(), 3);
        assert_eq!(SigningSecret::parse(" hex:00ff ").unwrap().len(), 2);
    }

    #[test]
    fn test_signing_secret_debug_is_redacted() {
        let secret = SigningSecret::new("top-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("top-secret"));
    }
}
