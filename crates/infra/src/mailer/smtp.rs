//! SMTP 確認メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 認証情報が設定されていれば STARTTLS + 認証で接続し、
//! なければ平文で接続する（Mailpit 等のローカル SMTP 向け）。

use async_trait::async_trait;
use courseworker_domain::user::Email;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{CONFIRMATION_SUBJECT, ConfirmationMailer, confirmation_body};
use crate::InfraError;

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host:       String,
    pub port:       u16,
    pub username:   Option<String>,
    pub password:   Option<String>,
    pub from_email: String,
    pub from_name:  Option<String>,
}

/// SMTP 確認メール送信
pub struct SmtpConfirmationMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from:      Mailbox,
}

impl SmtpConfirmationMailer {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # Errors
    ///
    /// - 送信元アドレスが不正な場合
    /// - TLS 接続の構築に失敗した場合
    pub fn new(settings: SmtpSettings) -> Result<Self, InfraError> {
        let address = settings
            .from_email
            .parse()
            .map_err(|e| InfraError::mail(format!("送信元アドレス不正: {e}")))?;
        let from = Mailbox::new(settings.from_name, address);

        let transport = match (settings.username, settings.password) {
            (Some(username), Some(password)) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                    .map_err(|e| InfraError::mail(format!("SMTP 接続設定失敗: {e}")))?
                    .port(settings.port)
                    .credentials(Credentials::new(username, password))
                    .build()
            }
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port)
                .build(),
        };

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl ConfirmationMailer for SmtpConfirmationMailer {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn send_confirmation(&self, to: &Email, link: &str) -> Result<(), InfraError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .as_str()
                .parse()
                .map_err(|e| InfraError::mail(format!("宛先アドレス不正: {e}")))?)
            .subject(CONFIRMATION_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(link))
            .map_err(|e| InfraError::mail(format!("メッセージ構築失敗: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| InfraError::mail(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
