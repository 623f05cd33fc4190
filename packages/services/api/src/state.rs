//! API 앱 상태

use std::sync::Arc;

use gv_core::auth::{CredentialVerifier, PasswordService, TokenService};

use crate::config::Config;
use crate::store::{MemoryStore, PgStore, RecordStore};

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다. 시작 후에는 변경되지 않습니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 레코드 저장소
    pub store: Arc<dyn RecordStore>,

    /// 토큰 발급/검증
    pub tokens: TokenService,

    /// 로그인 자격 증명 검증
    pub verifier: CredentialVerifier<Arc<dyn RecordStore>>,

    /// 사용자 생성/수정 시 비밀번호 해시
    pub passwords: PasswordService,
}

impl AppState {
    /// 새 상태 생성
    ///
    /// `database_url`이 있으면 PostgreSQL, 없으면 인메모리 저장소를 사용합니다.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn RecordStore> = match &config.database_url {
            Some(url) => {
                tracing::info!("Using PostgreSQL record store");
                Arc::new(PgStore::new(url, config.db_max_connections).await?)
            }
            None => {
                tracing::warn!("GV_DATABASE_URL not set, records are kept in memory only");
                Arc::new(MemoryStore::new())
            }
        };

        Self::with_store(config, store, PasswordService::default())
    }

    /// 저장소와 해시 파라미터를 지정해 생성
    pub fn with_store(
        config: &Config,
        store: Arc<dyn RecordStore>,
        passwords: PasswordService,
    ) -> anyhow::Result<Self> {
        let secret = config.signing_secret()?;
        let tokens = TokenService::new(&secret, config.token_ttl());
        let verifier = CredentialVerifier::new(store.clone(), passwords.clone())?;

        Ok(Self {
            config: config.clone(),
            store,
            tokens,
            verifier,
            passwords,
        })
    }
}
