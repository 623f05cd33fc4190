//! Bearer 토큰 게이트
//!
//! 보호된 라우트 앞에서 토큰을 검증하고, 성공하면 `AuthenticatedIdentity`를
//! 요청 확장에 넣습니다. 실패하면 핸들러와 저장소에 닿지 않고 401을 돌려줍니다.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use gv_core::auth::bearer_token;

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    let identity = bearer_token(header)
        .and_then(|token| state.tokens.validate(token))
        .map_err(|err| {
            tracing::debug!(
                reason = err.reason(),
                path = %req.uri().path(),
                "Rejected request at token gate"
            );
            ApiError::Core(err.into())
        })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
