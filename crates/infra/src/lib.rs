//! # Courseworker インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートは永続化・キャッシュ・トークン・メール送信の
//! トレイトと具体的な実装を提供する。ユースケース層はトレイトにのみ依存し、
//! 外部システムの詳細はこのクレートに閉じ込める。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **キャッシュ接続**: Redis による所有者キャッシュ
//! - **リポジトリ実装**: ユーザー・講座・タスク・所有者の永続化
//! - **認証基盤**: パスワードハッシュと JWT の発行・検証
//! - **メール送信**: 登録確認メール
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//!   ↘            ↗
//!     shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`cache`] - Redis キャッシュストア
//! - [`error`] - インフラ層エラー定義
//! - [`repository`] - リポジトリ実装
//! - [`password`] - パスワードハッシュ
//! - [`token`] - トークン発行・検証
//! - [`mailer`] - 確認メール送信
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use courseworker_infra::{cache::RedisCacheStore, db};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::create_pool("postgres://localhost/courseworker").await?;
//!     db::run_migrations(&pool).await?;
//!
//!     let cache = RedisCacheStore::new("redis://localhost").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod db;
pub mod error;
pub mod mailer;
pub mod password;
pub mod repository;
pub mod token;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use cache::{CacheStore, RedisCacheStore};
pub use error::{InfraError, InfraErrorKind};
pub use mailer::ConfirmationMailer;
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use token::{JwtTokenIssuer, TokenIssuer};
