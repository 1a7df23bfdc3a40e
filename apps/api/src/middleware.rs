//! # ミドルウェア
//!
//! - [`request_context`]: エラー変換器が参照するリクエスト情報を task-local に保存する
//! - [`auth`]: Bearer トークンを検証し、呼び出し元ユーザーをリクエストに載せる

pub mod auth;
pub mod request_context;

pub use auth::{AuthState, AuthUser, require_auth};
pub use request_context::{RequestContext, store_request_context};
