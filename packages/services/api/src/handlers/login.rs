//! 로그인 핸들러
//!
//! 자격 증명을 검증하고 Access Token을 발급합니다.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use gv_core::auth::{Credential, IssuedToken};
use gv_core::Error as CoreError;

use crate::error::{ApiJson, Result};
use crate::state::AppState;

/// 로그인 요청 본문
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,

    #[serde(alias = "password")]
    pub secret: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<IssuedToken>> {
    let credential = Credential::new(request.email, request.secret)?;

    let identity = match state.verifier.verify(&credential).await {
        Ok(identity) => identity,
        Err(CoreError::Auth(reason)) => {
            tracing::warn!(
                reason = reason.reason(),
                email = %credential.email(),
                "Login failed"
            );
            return Err(CoreError::Auth(reason).into());
        }
        Err(e) => return Err(e.into()),
    };

    let issued = state.tokens.issue(&identity)?;
    tracing::info!(user_id = identity.id, "Issued access token");

    Ok(Json(issued))
}
