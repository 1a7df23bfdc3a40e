//! # OwnershipRepository
//!
//! 所有者解決のための正本（system of record）への問い合わせ。
//!
//! キャッシュに所有者が見つからないときのフォールバック先として使う。
//! 読み取り専用で、データを変更することはない。

use async_trait::async_trait;
use courseworker_domain::{course::CourseId, task::TaskId, user::UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 所有者リポジトリトレイト
#[async_trait]
pub trait OwnershipRepository: Send + Sync {
    /// 講座の所有者を取得する。講座が存在しなければ `None`
    async fn find_course_owner(&self, course_id: CourseId) -> Result<Option<UserId>, InfraError>;

    /// タスクの所有者（= 所属講座の所有者）を取得する
    ///
    /// タスクが存在しない、または指定した講座に属していなければ `None`。
    async fn find_task_owner(
        &self,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Option<UserId>, InfraError>;
}

/// PostgreSQL 実装の OwnershipRepository
#[derive(Debug, Clone)]
pub struct PostgresOwnershipRepository {
    pool: PgPool,
}

impl PostgresOwnershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OwnershipRepository for PostgresOwnershipRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%course_id))]
    async fn find_course_owner(&self, course_id: CourseId) -> Result<Option<UserId>, InfraError> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM courses WHERE id = $1")
            .bind(course_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner.map(UserId::from_uuid))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%course_id, %task_id))]
    async fn find_task_owner(
        &self,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Option<UserId>, InfraError> {
        let owner: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT c.user_id
            FROM tasks t
            INNER JOIN courses c ON c.id = t.course_id
            WHERE t.id = $1 AND c.id = $2
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(course_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner.map(UserId::from_uuid))
    }
}
