//! # トークン発行・検証
//!
//! HS256 署名の JWT を使い、2 種類のトークンを扱う。
//!
//! | 用途 | クレーム | 発行タイミング |
//! |------|---------|--------------|
//! | アクセストークン | ユーザー ID | ログイン成功時 |
//! | 登録確認トークン | [`PendingRegistration`] | 登録申請時（確認メールのリンクに埋め込む） |
//!
//! ## 設計方針
//!
//! - **用途の取り違え防止**: クレームに `typ` を持たせ、登録確認トークンを
//!   アクセストークンとして使えないようにする
//! - **有効期限は [`Clock`] 基準**: 発行時刻をテストで固定できる

use std::sync::Arc;

use chrono::Duration;
use courseworker_domain::{
    clock::Clock,
    user::{PendingRegistration, UserId},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::InfraError;

const ACCESS_TOKEN_TYPE: &str = "access";
const REGISTRATION_TOKEN_TYPE: &str = "registration";

/// トークンの発行と検証を担当するトレイト
pub trait TokenIssuer: Send + Sync {
    /// アクセストークンを発行する
    fn issue_access(&self, user_id: &UserId) -> Result<String, InfraError>;

    /// アクセストークンを検証し、ユーザー ID を取り出す
    ///
    /// # Errors
    ///
    /// - 署名不正、期限切れ、用途違いの場合
    fn verify_access(&self, token: &str) -> Result<UserId, InfraError>;

    /// 登録確認トークンを発行する
    fn issue_registration(&self, registration: &PendingRegistration)
    -> Result<String, InfraError>;

    /// 登録確認トークンを検証し、登録内容を取り出す
    fn verify_registration(&self, token: &str) -> Result<PendingRegistration, InfraError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: Uuid,
    typ: String,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistrationClaims {
    #[serde(flatten)]
    registration: PendingRegistration,
    typ:          String,
    exp:          i64,
}

/// jsonwebtoken（HS256）による実装
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in:   Duration,
    clock:        Arc<dyn Clock>,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, expires_in: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            clock,
        }
    }

    fn expires_at(&self) -> i64 {
        (self.clock.now() + self.expires_in).timestamp()
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, InfraError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, InfraError> {
        let validation = Validation::new(Algorithm::HS256);
        Ok(decode::<T>(token, &self.decoding_key, &validation)?.claims)
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue_access(&self, user_id: &UserId) -> Result<String, InfraError> {
        self.sign(&AccessClaims {
            sub: *user_id.as_uuid(),
            typ: ACCESS_TOKEN_TYPE.to_string(),
            exp: self.expires_at(),
        })
    }

    fn verify_access(&self, token: &str) -> Result<UserId, InfraError> {
        let claims: AccessClaims = self.decode(token)?;
        if claims.typ != ACCESS_TOKEN_TYPE {
            return Err(InfraError::unexpected(format!(
                "アクセストークンではありません: typ={}",
                claims.typ
            )));
        }
        Ok(UserId::from_uuid(claims.sub))
    }

    fn issue_registration(
        &self,
        registration: &PendingRegistration,
    ) -> Result<String, InfraError> {
        self.sign(&RegistrationClaims {
            registration: registration.clone(),
            typ:          REGISTRATION_TOKEN_TYPE.to_string(),
            exp:          self.expires_at(),
        })
    }

    fn verify_registration(&self, token: &str) -> Result<PendingRegistration, InfraError> {
        let claims: RegistrationClaims = self.decode(token)?;
        if claims.typ != REGISTRATION_TOKEN_TYPE {
            return Err(InfraError::unexpected(format!(
                "登録確認トークンではありません: typ={}",
                claims.typ
            )));
        }
        Ok(claims.registration)
    }
}
