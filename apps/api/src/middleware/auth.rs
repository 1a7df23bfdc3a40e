//! # 認証ミドルウェア
//!
//! `Authorization: Bearer <token>` を検証し、[`AuthUser`] をリクエスト extensions に挿入する。
//!
//! | 状況 | ステータス | メッセージ |
//! |------|-----------|-----------|
//! | ヘッダーなし | 401 | `You must be logged in first.` |
//! | `Bearer <token>` 形式でない | 401 | `Invalid Token` |
//! | トークンの検証失敗 | 401 | `Failed Decode Token` |
//!
//! レスポンスとログは [`render_unauthorized`] が組み立てるため、
//! 他のエラーと同じく相関 ID が付く。
//!
//! ## 使い方
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//!
//! Router::new()
//!     .route("/courses", get(list_courses))
//!     .route_layer(from_fn_with_state(auth_state, require_auth))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use courseworker_domain::user::UserId;
use courseworker_infra::TokenIssuer;

use super::RequestContext;
use crate::error::render_unauthorized;

/// 認証済みの呼び出し元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthState {
    pub token_issuer: Arc<dyn TokenIssuer>,
}

/// 認証ミドルウェア
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return unauthorized("You must be logged in first.", None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, token)| *scheme == "Bearer" && !token.is_empty() && !token.contains(' '))
        .map(|(_, token)| token.to_string());
    let Some(token) = token else {
        return unauthorized("Invalid Token", None);
    };

    match state.token_issuer.verify_access(&token) {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthUser { user_id });
            next.run(request).await
        }
        Err(e) => unauthorized("Failed Decode Token", Some(&e)),
    }
}

fn unauthorized(message: &str, cause: Option<&(dyn std::error::Error + 'static)>) -> Response {
    render_unauthorized(&RequestContext::current(), message, cause)
}
