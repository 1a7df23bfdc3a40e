//! # Courseworker 共有ユーティリティ
//!
//! API レスポンスの形式とロギング初期化など、
//! ビジネスロジックを含まない共通部品を提供する。
//!
//! ## 設計方針
//!
//! - ドメイン層・インフラ層には依存しない
//! - axum には依存しない（`IntoResponse` 変換は API 側の責務）
//! - ロギング関連は `observability` feature で有効化する

pub mod api_response;
pub mod error_response;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::{ErrorDetail, ErrorParam, ErrorResponse};
pub use health::HealthResponse;
