//! # TaskRepository
//!
//! タスクの永続化を担当するリポジトリ。
//!
//! タスクは常に所属する講座と組で扱う。`course_id` が一致しないタスクは
//! 「存在しない」として扱う。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courseworker_domain::{
    course::CourseId,
    task::{Task, TaskId, TaskTitle, TaskType},
    user::UserId,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// タスクリポジトリトレイト
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// ユーザーが所有する講座に属する全タスクを取得する
    async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Task>, InfraError>;

    /// 講座に属するタスクを取得する
    async fn find_all_by_course(&self, course_id: CourseId) -> Result<Vec<Task>, InfraError>;

    /// 講座とタスク ID の組でタスクを検索する
    async fn find_by_id(
        &self,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Option<Task>, InfraError>;

    /// タスクを挿入する
    async fn insert(&self, task: &Task) -> Result<(), InfraError>;

    /// タスクを更新する。対象行が存在しなければ `Ok(false)`
    async fn update(&self, task: &Task) -> Result<bool, InfraError>;

    /// タスクを削除する。対象行が存在しなければ `Ok(false)`
    async fn delete(&self, course_id: CourseId, task_id: &TaskId) -> Result<bool, InfraError>;
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id:          Uuid,
    course_id:   i64,
    is_done:     bool,
    highlight:   bool,
    title:       String,
    description: Option<String>,
    image:       Option<String>,
    #[sqlx(rename = "type")]
    task_type:   String,
    deadline:    Option<DateTime<Utc>>,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = InfraError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let title = TaskTitle::new(row.title)
            .map_err(|e| InfraError::unexpected(format!("不正なタスク名が格納されています: {e}")))?;
        let task_type = TaskType::new(row.task_type)
            .map_err(|e| InfraError::unexpected(format!("不正なタスク種別が格納されています: {e}")))?;
        Ok(Task::from_db(
            TaskId::from_uuid(row.id),
            CourseId::new(row.course_id),
            row.is_done,
            row.highlight,
            title,
            row.description,
            row.image,
            task_type,
            row.deadline,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// PostgreSQL 実装の TaskRepository
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_all_by_user(&self, user_id: &UserId) -> Result<Vec<Task>, InfraError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                t.id, t.course_id, t.is_done, t.highlight, t.title, t.description,
                t.image, t.type, t.deadline, t.created_at, t.updated_at
            FROM tasks t
            INNER JOIN courses c ON c.id = t.course_id
            WHERE c.user_id = $1
            ORDER BY t.deadline ASC NULLS LAST, t.created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%course_id))]
    async fn find_all_by_course(&self, course_id: CourseId) -> Result<Vec<Task>, InfraError> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                id, course_id, is_done, highlight, title, description,
                image, type, deadline, created_at, updated_at
            FROM tasks
            WHERE course_id = $1
            ORDER BY deadline ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(course_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%course_id, %task_id))]
    async fn find_by_id(
        &self,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Option<Task>, InfraError> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT
                id, course_id, is_done, highlight, title, description,
                image, type, deadline, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND course_id = $2
            "#,
        )
        .bind(task_id.as_uuid())
        .bind(course_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(task_id = %task.id()))]
    async fn insert(&self, task: &Task) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, course_id, is_done, highlight, title, description,
                image, type, deadline, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(task.id().as_uuid())
        .bind(task.course_id().as_i64())
        .bind(task.is_done())
        .bind(task.highlight())
        .bind(task.title().as_str())
        .bind(task.description())
        .bind(task.image())
        .bind(task.task_type().as_str())
        .bind(task.deadline())
        .bind(task.created_at())
        .bind(task.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(task_id = %task.id()))]
    async fn update(&self, task: &Task) -> Result<bool, InfraError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET is_done = $3, highlight = $4, title = $5, description = $6,
                type = $7, deadline = $8, updated_at = $9
            WHERE id = $1 AND course_id = $2
            "#,
        )
        .bind(task.id().as_uuid())
        .bind(task.course_id().as_i64())
        .bind(task.is_done())
        .bind(task.highlight())
        .bind(task.title().as_str())
        .bind(task.description())
        .bind(task.task_type().as_str())
        .bind(task.deadline())
        .bind(task.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%course_id, %task_id))]
    async fn delete(&self, course_id: CourseId, task_id: &TaskId) -> Result<bool, InfraError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND course_id = $2")
            .bind(task_id.as_uuid())
            .bind(course_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
