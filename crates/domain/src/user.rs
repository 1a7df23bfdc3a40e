//! # ユーザー
//!
//! 講座とタスクの所有者となるアカウント。
//!
//! ## 登録フロー
//!
//! 1. 登録リクエストを検証し、パスワードをハッシュ化する
//! 2. [`PendingRegistration`] を確認トークンに封入してメールで送る
//! 3. 確認リンクが開かれた時点で [`User`] を永続化する

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Kind, Problem},
    password::PasswordHash,
};

define_uuid_id! {
    /// ユーザー ID
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー名
    pub struct UserName {
        field: "name",
        max_length: 100,
    }
}

/// メールアドレス
///
/// `local@domain` の形だけを検証する。到達可能性は確認しない。
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct Email(String);

impl std::fmt::Debug for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Email").field(&"[REDACTED]").finish()
    }
}

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, Problem> {
        let value = value.into().trim().to_lowercase();

        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            }
            None => false,
        };

        if !valid {
            return Err(Problem::builder()
                .kind(Kind::Validation)
                .title("Invalid field value")
                .detail("email must be a valid email address")
                .param("email", "must be a valid email format")
                .build());
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ユーザーエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id:          UserId,
    name:        UserName,
    email:       Email,
    password:    PasswordHash,
    profile_img: Option<String>,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl User {
    /// 新規ユーザーを作成する
    pub fn new(name: UserName, email: Email, password: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name,
            email,
            password,
            profile_img: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースの行から復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: UserId,
        name: UserName,
        email: Email,
        password: PasswordHash,
        profile_img: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password,
            profile_img,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &PasswordHash {
        &self.password
    }

    pub fn profile_img(&self) -> Option<&str> {
        self.profile_img.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// メール確認待ちの登録内容
///
/// 確認トークンのクレームとして往復するため、検証済みの値を文字列で保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub name:          String,
    pub email:         String,
    pub password_hash: String,
}
