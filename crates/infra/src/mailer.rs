//! # 確認メール送信
//!
//! 登録申請時に送る確認メールの送信を担当する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`ConfirmationMailer`] でメール送信を抽象化
//! - **2 つの実装**: SMTP（lettre）と Noop（ログ出力のみ）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択

mod noop;
mod smtp;

use async_trait::async_trait;
use courseworker_domain::user::Email;
pub use noop::NoopConfirmationMailer;
pub use smtp::{SmtpConfirmationMailer, SmtpSettings};

use crate::InfraError;

/// 確認メールの件名
pub const CONFIRMATION_SUBJECT: &str = "Email Confirmation";

/// 確認メールの本文を組み立てる
pub fn confirmation_body(link: &str) -> String {
    format!("Please confirm your email by clicking on the following link: {link}")
}

/// 確認メール送信トレイト
#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    /// 確認リンクを記載したメールを送信する
    async fn send_confirmation(&self, to: &Email, link: &str) -> Result<(), InfraError>;
}
