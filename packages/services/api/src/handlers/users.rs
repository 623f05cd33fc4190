//! 사용자 생성/수정 핸들러
//!
//! 비밀번호는 평문으로 저장하지 않고 Argon2id 해시로 바꿔 저장합니다.
//! 조회/삭제는 `records`의 일반 핸들러를 씁니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};

use gv_core::records::{NewUser, Record, User, UserUpdate};

use super::parse_id;
use super::records::{decode, not_found};
use crate::error::{ApiJson, Result};
use crate::state::AppState;

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    request.validate()?;
    let password_hash = state.passwords.hash(&request.password)?;

    let row = state
        .store
        .insert(
            User::KIND,
            json!({
                "email": request.email,
                "password_hash": password_hash,
                "role": request.role,
            }),
        )
        .await?;
    let user: User = decode(row)?;

    tracing::info!(user_id = user.id, role = %user.role, "Created user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// 사용자 수정 (비밀번호가 있으면 다시 해시)
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UserUpdate>,
) -> Result<Json<User>> {
    let id = parse_id(&id)?;
    request.validate()?;

    if state.store.get(User::KIND, id).await?.is_none() {
        return Err(not_found(User::KIND));
    }

    let mut changes = Map::new();
    if let Some(email) = request.email {
        changes.insert("email".to_string(), Value::from(email));
    }
    if let Some(role) = request.role {
        changes.insert("role".to_string(), serde_json::to_value(role)?);
    }
    if let Some(password) = request.password {
        let password_hash = state.passwords.hash(&password)?;
        changes.insert("password_hash".to_string(), Value::from(password_hash));
    }

    let row = state
        .store
        .update(User::KIND, id, Value::Object(changes))
        .await?
        .ok_or_else(|| not_found(User::KIND))?;

    Ok(Json(decode(row)?))
}
