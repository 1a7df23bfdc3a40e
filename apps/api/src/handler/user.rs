//! # ユーザーハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /users` - ユーザー一覧
//! - `GET /users/{user_id}` - ユーザー詳細
//! - `POST /register` - 登録申請（確認メール送信）
//! - `GET /account-confirm?token=...` - 確認リンクからのユーザー作成
//! - `POST /login` - ログイン（アクセストークン発行）
//!
//! いずれも認証不要。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use courseworker_domain::{
    error::{Kind, Problem},
    password::PlainPassword,
    user::{User, UserId},
};
use courseworker_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::ValidatedJson,
    usecase::{LoginInput, RegisterInput, UserUseCaseImpl},
};

/// ユーザー API の共有状態
pub struct UserState {
    pub usecase: UserUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 登録申請リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name:             String,
    #[validate(email)]
    pub email:            String,
    #[validate(length(min = 8, max = 72))]
    pub password:         String,
    #[validate(length(min = 1))]
    pub confirm_password: String,
}

/// ログインリクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email:    String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// 確認リンクのクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: Option<String>,
}

/// ユーザー DTO
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id:          Uuid,
    pub name:        String,
    pub email:       String,
    pub profile_img: Option<String>,
    pub created_at:  String,
    pub updated_at:  String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id:          *user.id().as_uuid(),
            name:        user.name().to_string(),
            email:       user.email().to_string(),
            profile_img: user.profile_img().map(str::to_string),
            created_at:  user.created_at().to_rfc3339(),
            updated_at:  user.updated_at().to_rfc3339(),
        }
    }
}

/// 登録申請レスポンス
#[derive(Debug, Serialize)]
pub struct RegisterDto {
    pub email: String,
}

/// ユーザー作成レスポンス
#[derive(Debug, Serialize)]
pub struct CreatedUserDto {
    pub id: Uuid,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub token: String,
}

// --- ハンドラ ---

/// GET /users
pub async fn list_users(State(state): State<Arc<UserState>>) -> Result<impl IntoResponse, ApiError> {
    let users = state.usecase.list_users().await?;

    let items: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("Users successfully retrieved", items)),
    ))
}

/// GET /users/{user_id}
pub async fn get_user(
    State(state): State<Arc<UserState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id: UserId = user_id.parse().map_err(|e| {
        Problem::builder()
            .op("hand/GetUserByID")
            .kind(Kind::InvalidRequest)
            .title("Invalid request")
            .detail("failed parsing user id")
            .cause(e)
            .build()
    })?;

    let user = state.usecase.get_user(&user_id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("User successfully retrieved", UserDto::from(user))),
    ))
}

/// POST /register
///
/// ## レスポンス
///
/// - `200 OK`: 確認メールを送信した
/// - `400 Bad Request`: 確認用パスワードの不一致
/// - `403 Forbidden`: メールアドレスが使用済み
/// - `422 Unprocessable Entity`: フィールド検証エラー
pub async fn register(
    State(state): State<Arc<UserState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterInput {
        name:             req.name,
        email:            req.email,
        password:         PlainPassword::new(req.password),
        confirm_password: PlainPassword::new(req.confirm_password),
    };

    let email = state.usecase.register(input).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(
            "Confirmation email sent",
            RegisterDto {
                email: email.to_string(),
            },
        )),
    ))
}

/// GET /account-confirm?token=...
pub async fn confirm_account(
    State(state): State<Arc<UserState>>,
    Query(query): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let token = query.token.filter(|t| !t.is_empty()).ok_or_else(|| {
        Problem::builder()
            .op("hand/CreateConfirmedUser")
            .kind(Kind::InvalidRequest)
            .title("Invalid request")
            .detail("confirmation token is required")
            .param("token", "this field is required")
            .build()
    })?;

    let user_id = state.usecase.confirm_account(&token).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "User successfully created",
            CreatedUserDto {
                id: *user_id.as_uuid(),
            },
        )),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<UserState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = LoginInput {
        email:    req.email,
        password: PlainPassword::new(req.password),
    };

    let token = state.usecase.login(input).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("User successfully logged in", TokenDto { token })),
    ))
}
