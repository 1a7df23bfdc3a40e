//! Noop 確認メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 開発環境やメール送信無効化時に使用する。

use async_trait::async_trait;
use courseworker_domain::user::Email;

use super::{CONFIRMATION_SUBJECT, ConfirmationMailer};
use crate::InfraError;

/// Noop 確認メール送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopConfirmationMailer;

#[async_trait]
impl ConfirmationMailer for NoopConfirmationMailer {
    async fn send_confirmation(&self, to: &Email, link: &str) -> Result<(), InfraError> {
        tracing::info!(
            to = %to.as_str(),
            subject = CONFIRMATION_SUBJECT,
            link,
            "Noop: 確認メール送信をスキップ"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_confirmationがエラーを返さない() {
        let mailer = NoopConfirmationMailer;
        let to = Email::new("test@example.com").unwrap();

        let result = mailer
            .send_confirmation(&to, "http://localhost/account-confirm?token=t")
            .await;

        assert!(result.is_ok());
    }
}
