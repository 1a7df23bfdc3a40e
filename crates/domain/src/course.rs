//! # 講座
//!
//! ユーザーが所有するタスクのまとまり。ID はデータベースが採番する。
//! 所有者（`user_id`）は作成後に変わらない。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// 講座 ID（データベース採番の整数）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct CourseId(i64);

impl CourseId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::str::FromStr for CourseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

define_validated_string! {
    /// 講座名
    pub struct CourseName {
        field: "name",
        max_length: 255,
    }
}

/// 作成前の講座（ID 未採番）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name:       CourseName,
    pub subname:    Option<String>,
    pub user_id:    UserId,
    pub created_at: DateTime<Utc>,
}

/// 講座エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id:         CourseId,
    name:       CourseName,
    subname:    Option<String>,
    user_id:    UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Course {
    /// 採番済み ID と作成内容から講座を組み立てる
    pub fn from_new(id: CourseId, new: NewCourse) -> Self {
        Self {
            id,
            name: new.name,
            subname: new.subname,
            user_id: new.user_id,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    /// データベースの行から復元する
    pub fn from_db(
        id: CourseId,
        name: CourseName,
        subname: Option<String>,
        user_id: UserId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            subname,
            user_id,
            created_at,
            updated_at,
        }
    }

    /// 名前とサブ名を差し替えた新しい状態を返す
    pub fn renamed(self, name: CourseName, subname: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            name,
            subname,
            updated_at: now,
            ..self
        }
    }

    pub fn id(&self) -> CourseId {
        self.id
    }

    pub fn name(&self) -> &CourseName {
        &self.name
    }

    pub fn subname(&self) -> Option<&str> {
        self.subname.as_deref()
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
