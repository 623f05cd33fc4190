//! API 서버 설정

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use gv_core::auth::{SigningSecret, TokenService};

/// API 서버 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// PostgreSQL URL (없으면 인메모리 저장소)
    pub database_url: Option<String>,

    /// DB Connection Pool 크기
    pub db_max_connections: u32,

    /// 토큰 서명 키 원문 (`base64:`/`hex:` 접두사 지원)
    pub jwt_secret: String,

    /// 토큰 유효 기간 (초)
    pub token_ttl_secs: i64,
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("GV_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() {
            bail!("GV_JWT_SECRET must be set");
        }

        let token_ttl_secs = parse_or(&lookup, "GV_TOKEN_TTL_SECS", TokenService::DEFAULT_TTL_SECS)?;
        if token_ttl_secs <= 0 {
            bail!("GV_TOKEN_TTL_SECS must be positive, got {}", token_ttl_secs);
        }
        if !ttl_in_range(token_ttl_secs, Utc::now()) {
            bail!(
                "GV_TOKEN_TTL_SECS is too large, token expiry would be out of range: {}",
                token_ttl_secs
            );
        }

        Ok(Self {
            port: parse_or(&lookup, "GV_PORT", 8080)?,

            database_url: lookup("GV_DATABASE_URL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            db_max_connections: parse_or(&lookup, "GV_DB_MAX_CONNECTIONS", 10)?,

            jwt_secret,
            token_ttl_secs,
        })
    }

    /// 서명 키 파싱
    pub fn signing_secret(&self) -> anyhow::Result<SigningSecret> {
        let secret = SigningSecret::parse(&self.jwt_secret).context("invalid GV_JWT_SECRET")?;
        if secret.is_empty() {
            bail!("GV_JWT_SECRET decodes to an empty key");
        }
        Ok(secret)
    }

    /// 토큰 유효 기간 (범위를 벗어나면 0, 발급 시 에러)
    pub fn token_ttl(&self) -> Duration {
        Duration::try_seconds(self.token_ttl_secs).unwrap_or_else(Duration::zero)
    }
}

/// 지금 발급한 토큰의 만료 시각을 표현할 수 있는지
fn ttl_in_range(ttl_secs: i64, now: DateTime<Utc>) -> bool {
    Duration::try_seconds(ttl_secs).is_some()
        && now
            .timestamp()
            .checked_add(ttl_secs)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .is_some()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field(
                "database",
                &if self.database_url.is_some() { "postgres" } else { "memory" },
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}
