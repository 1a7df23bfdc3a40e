//! # CourseRepository
//!
//! 講座の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **ID はデータベース採番**: `INSERT ... RETURNING id` で採番結果を受け取る
//! - **存在しない行は `None` / `false`**: 「見つからない」をエラーにせず、
//!   ユースケース層で `Kind::NotExist` に変換する

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courseworker_domain::{
    course::{Course, CourseId, CourseName, NewCourse},
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 講座リポジトリトレイト
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// ユーザーが所有する講座を ID 順で取得する
    async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Course>, InfraError>;

    /// ID で講座を検索する
    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, InfraError>;

    /// 講座を挿入し、採番済みの講座を返す
    async fn insert(&self, course: NewCourse) -> Result<Course, InfraError>;

    /// 講座を更新する
    ///
    /// 対象行が存在しなければ `Ok(false)` を返す。
    async fn update(&self, course: &Course) -> Result<bool, InfraError>;

    /// 講座を削除する
    ///
    /// 対象行が存在しなければ `Ok(false)` を返す。
    async fn delete(&self, id: CourseId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id:         i64,
    name:       String,
    subname:    Option<String>,
    user_id:    Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = InfraError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let name = CourseName::new(row.name)
            .map_err(|e| InfraError::unexpected(format!("不正な講座名が格納されています: {e}")))?;
        Ok(Course::from_db(
            CourseId::new(row.id),
            name,
            row.subname,
            UserId::from_uuid(row.user_id),
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の CourseRepository
#[derive(Debug, Clone)]
pub struct PostgresCourseRepository {
    pool: PgPool,
}

impl PostgresCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PostgresCourseRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Course>, InfraError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, subname, user_id, created_at, updated_at
            FROM courses
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Course::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: CourseId) -> Result<Option<Course>, InfraError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, name, subname, user_id, created_at, updated_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Course::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(user_id = %course.user_id))]
    async fn insert(&self, course: NewCourse) -> Result<Course, InfraError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO courses (name, subname, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id
            "#,
        )
        .bind(course.name.as_str())
        .bind(course.subname.as_deref())
        .bind(course.user_id.as_uuid())
        .bind(course.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Course::from_new(CourseId::new(id), course))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %course.id()))]
    async fn update(&self, course: &Course) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET name = $2, subname = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(course.id().as_i64())
        .bind(course.name().as_str())
        .bind(course.subname())
        .bind(course.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn delete(&self, id: CourseId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
