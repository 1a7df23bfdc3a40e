//! # API サーバー設定
//!
//! 環境変数から API サーバーの設定を読み込む。
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | No | ポート番号（デフォルト: `8000`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `REDIS_URL` | **Yes** | Redis 接続 URL |
//! | `JWT_SECRET_KEY` | **Yes** | トークン署名鍵 |
//! | `JWT_EXP_SECONDS` | No | トークン有効期間（デフォルト: `10800`） |
//! | `BASE_URL` | No | 確認メールのリンクに使う URL（デフォルト: `http://localhost:8000`） |
//! | `MAIL_BACKEND` | No | `smtp` または `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP サーバー（デフォルト: `localhost:1025`） |
//! | `SMTP_USER` / `SMTP_PASS` | No | SMTP 認証情報 |
//! | `FROM_EMAIL` / `FROM_NAME` | No | 送信元 |

use std::{env, str::FromStr};

use strum::EnumString;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MailBackend {
    Smtp,
    Noop,
}

/// SMTP 設定
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host:       String,
    pub port:       u16,
    pub username:   Option<String>,
    pub password:   Option<String>,
    pub from_email: String,
    pub from_name:  Option<String>,
}

/// API サーバーの設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// バインドアドレス
    pub host:            String,
    /// ポート番号
    pub port:            u16,
    /// データベース接続 URL
    pub database_url:    String,
    /// Redis 接続 URL
    pub redis_url:       String,
    /// トークン署名鍵
    pub jwt_secret:      String,
    /// トークン有効期間（秒）
    pub jwt_exp_seconds: i64,
    /// 確認メールのリンクに使う URL
    pub base_url:        String,
    /// メール送信バックエンド
    pub mail_backend:    MailBackend,
    /// SMTP 設定
    pub smtp:            SmtpConfig,
}

impl ApiConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を読み込む
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host:            or_default("API_HOST", "0.0.0.0"),
            port:            parse("API_PORT", &or_default("API_PORT", "8000"))?,
            database_url:    required("DATABASE_URL")?,
            redis_url:       required("REDIS_URL")?,
            jwt_secret:      required("JWT_SECRET_KEY")?,
            jwt_exp_seconds: parse("JWT_EXP_SECONDS", &or_default("JWT_EXP_SECONDS", "10800"))?,
            base_url:        or_default("BASE_URL", "http://localhost:8000")
                .trim_end_matches('/')
                .to_string(),
            mail_backend:    parse("MAIL_BACKEND", &or_default("MAIL_BACKEND", "noop"))?,
            smtp:            SmtpConfig {
                host:       or_default("SMTP_HOST", "localhost"),
                port:       parse("SMTP_PORT", &or_default("SMTP_PORT", "1025"))?,
                username:   lookup("SMTP_USER"),
                password:   lookup("SMTP_PASS"),
                from_email: or_default("FROM_EMAIL", "noreply@courseworker.example.com"),
                from_name:  lookup("FROM_NAME"),
            },
        })
    }

    /// テスト用: キーと値の組から設定を読み込む
    #[cfg(test)]
    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self::from_lookup(|name| map.get(name).cloned())
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/courseworker"),
        ("REDIS_URL", "redis://localhost:6379"),
        ("JWT_SECRET_KEY", "secret"),
    ];

    #[test]
    fn test_必須項目だけでデフォルト値が使われる() {
        let config = ApiConfig::from_pairs(&REQUIRED).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.jwt_exp_seconds, 10800);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.mail_backend, MailBackend::Noop);
        assert_eq!(config.smtp.port, 1025);
        assert_eq!(config.smtp.username, None);
    }

    #[test]
    fn test_必須項目が欠けているとエラー() {
        let result = ApiConfig::from_pairs(&REQUIRED[..2]);

        assert_eq!(result.unwrap_err(), ConfigError::Missing("JWT_SECRET_KEY"));
    }

    #[test]
    fn test_不正なポート番号はエラー() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("API_PORT", "eighty"));

        let result = ApiConfig::from_pairs(&pairs);

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::Invalid { name: "API_PORT", .. }
        ));
    }

    #[test]
    fn test_mail_backendとbase_urlを読み込む() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MAIL_BACKEND", "smtp"));
        pairs.push(("BASE_URL", "https://courseworker.example.com/"));

        let config = ApiConfig::from_pairs(&pairs).unwrap();

        assert_eq!(config.mail_backend, MailBackend::Smtp);
        assert_eq!(config.base_url, "https://courseworker.example.com");
    }

    #[test]
    fn test_不明なmail_backendはエラー() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MAIL_BACKEND", "ses"));

        assert!(ApiConfig::from_pairs(&pairs).is_err());
    }
}
