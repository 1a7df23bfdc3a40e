//! # Courseworker ドメイン層
//!
//! ユーザー・講座・タスクのドメインモデルと、レイヤーを跨いで使う
//! 構造化エラー [`Problem`](error::Problem) を定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（DB、キャッシュ、メール）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - 構造化エラーと op スタック
//! - [`user`] / [`course`] / [`task`] - エンティティと値オブジェクト
//! - [`ownership`] - 認可判定の対象リソース
//! - [`password`] - パスワードの値オブジェクト
//! - [`clock`] - 時刻プロバイダ

#[macro_use]
mod macros;

pub mod clock;
pub mod course;
pub mod error;
pub mod ownership;
pub mod password;
pub mod task;
pub mod user;

pub use error::{Kind, Problem};
