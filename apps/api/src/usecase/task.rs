//! # タスクユースケース
//!
//! 講座に属するタスクの一覧・取得・作成・更新・ハイライト切り替え・削除を実装する。
//!
//! ## 認可
//!
//! | 操作 | ガード対象 |
//! |------|-----------|
//! | 全タスク一覧 | なし（所有者でクエリを絞り込む） |
//! | 講座のタスク一覧・タスク作成 | 講座 |
//! | 取得・更新・ハイライト切り替え・削除 | タスク |

use std::sync::Arc;

use courseworker_domain::{
    clock::Clock,
    course::CourseId,
    error::Problem,
    ownership::ResourceRef,
    task::{Task, TaskChanges, TaskId, TaskTitle, TaskType, parse_deadline},
    user::UserId,
};
use courseworker_infra::repository::TaskRepository;

use super::{
    helpers::{AffectedResultExt, InfraResultExt, OptionExt, invalid_input, rewrap},
    ownership::OwnershipGuard,
};

/// タスク作成の入力
#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    pub title:       String,
    pub task_type:   String,
    pub description: Option<String>,
    /// `YYYY-MM-DD HH:MM`
    pub deadline:    Option<String>,
}

/// タスク更新の入力（`None` のフィールドは変更しない）
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskInput {
    pub title:       Option<String>,
    pub task_type:   Option<String>,
    pub description: Option<String>,
    pub deadline:    Option<String>,
    pub is_done:     Option<bool>,
}

/// タスクユースケース実装
pub struct TaskUseCaseImpl {
    tasks: Arc<dyn TaskRepository>,
    guard: Arc<OwnershipGuard>,
    clock: Arc<dyn Clock>,
}

impl TaskUseCaseImpl {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        guard: Arc<OwnershipGuard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            guard,
            clock,
        }
    }

    /// 呼び出し元が所有する全講座のタスクを取得する
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn list_all_tasks(&self, user_id: &UserId) -> Result<Vec<Task>, Problem> {
        self.tasks
            .find_all_by_user(user_id)
            .await
            .or_database("serv/GetAllTasks", "Failed to get tasks")
    }

    /// 講座に属するタスクを取得する
    #[tracing::instrument(skip_all, fields(%user_id, %course_id))]
    pub async fn list_course_tasks(
        &self,
        user_id: &UserId,
        course_id: CourseId,
    ) -> Result<Vec<Task>, Problem> {
        const OP: &str = "serv/GetTasksByCourseID";
        const TITLE: &str = "Failed to get tasks";

        self.guard
            .assert_ownership(user_id, &ResourceRef::Course(course_id))
            .await
            .map_err(rewrap(OP, TITLE))?;

        self.tasks
            .find_all_by_course(course_id)
            .await
            .or_database(OP, TITLE)
    }

    /// 講座にタスクを作成し、所有者をキャッシュに書き込む
    #[tracing::instrument(skip_all, fields(%user_id, %course_id))]
    pub async fn create_task(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        input: CreateTaskInput,
    ) -> Result<Task, Problem> {
        const OP: &str = "serv/CreateTask";
        const TITLE: &str = "Failed to create task";

        self.guard
            .assert_ownership(user_id, &ResourceRef::Course(course_id))
            .await
            .map_err(rewrap(OP, TITLE))?;

        let title = TaskTitle::new(input.title).map_err(invalid_input(OP))?;
        let task_type = TaskType::new(input.task_type).map_err(invalid_input(OP))?;
        let deadline = input
            .deadline
            .as_deref()
            .map(parse_deadline)
            .transpose()
            .map_err(|e| Problem::wrap(OP, e))?;

        let task = Task::new(
            course_id,
            title,
            task_type,
            input.description,
            deadline,
            self.clock.now(),
        );
        self.tasks.insert(&task).await.or_database(OP, TITLE)?;

        self.guard
            .remember(&task_ref(course_id, task.id()), user_id)
            .await;

        tracing::info!(task_id = %task.id(), "タスクを作成しました");
        Ok(task)
    }

    /// タスクを取得する
    #[tracing::instrument(skip_all, fields(%user_id, %course_id, %task_id))]
    pub async fn get_task(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Task, Problem> {
        const OP: &str = "serv/GetTaskByID";

        self.guard
            .assert_ownership(user_id, &task_ref(course_id, task_id))
            .await
            .map_err(rewrap(OP, "Failed to get task"))?;

        self.find_task(OP, course_id, task_id).await
    }

    /// タスクのフィールドを更新する
    #[tracing::instrument(skip_all, fields(%user_id, %course_id, %task_id))]
    pub async fn update_task(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        task_id: &TaskId,
        input: UpdateTaskInput,
    ) -> Result<Task, Problem> {
        const OP: &str = "serv/UpdateTask";
        const TITLE: &str = "Failed to update task";

        self.guard
            .assert_ownership(user_id, &task_ref(course_id, task_id))
            .await
            .map_err(rewrap(OP, TITLE))?;

        let changes = TaskChanges {
            title:       input
                .title
                .map(TaskTitle::new)
                .transpose()
                .map_err(invalid_input(OP))?,
            task_type:   input
                .task_type
                .map(TaskType::new)
                .transpose()
                .map_err(invalid_input(OP))?,
            description: input.description,
            deadline:    input
                .deadline
                .as_deref()
                .map(parse_deadline)
                .transpose()
                .map_err(|e| Problem::wrap(OP, e))?,
            is_done:     input.is_done,
        };

        let task = self
            .find_task(OP, course_id, task_id)
            .await?
            .apply(changes, self.clock.now());

        self.tasks.update(&task).await.or_no_row(OP, TITLE)?;
        Ok(task)
    }

    /// タスクのハイライトを反転する
    #[tracing::instrument(skip_all, fields(%user_id, %course_id, %task_id))]
    pub async fn toggle_highlight(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Task, Problem> {
        const OP: &str = "serv/UpdateHighlightTask";
        const TITLE: &str = "Failed to update task";

        self.guard
            .assert_ownership(user_id, &task_ref(course_id, task_id))
            .await
            .map_err(rewrap(OP, TITLE))?;

        let task = self
            .find_task(OP, course_id, task_id)
            .await?
            .toggle_highlight(self.clock.now());

        self.tasks.update(&task).await.or_no_row(OP, TITLE)?;
        Ok(task)
    }

    /// タスクを削除し、所有者をキャッシュから取り除く
    #[tracing::instrument(skip_all, fields(%user_id, %course_id, %task_id))]
    pub async fn delete_task(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<(), Problem> {
        const OP: &str = "serv/DeleteTask";
        const TITLE: &str = "Failed to delete task";

        let resource = task_ref(course_id, task_id);
        self.guard
            .assert_ownership(user_id, &resource)
            .await
            .map_err(rewrap(OP, TITLE))?;

        self.tasks
            .delete(course_id, task_id)
            .await
            .or_no_row(OP, TITLE)?;

        self.guard.forget(&resource).await;
        Ok(())
    }

    async fn find_task(
        &self,
        op: &'static str,
        course_id: CourseId,
        task_id: &TaskId,
    ) -> Result<Task, Problem> {
        self.tasks
            .find_by_id(course_id, task_id)
            .await
            .or_database(op, "Failed to get task")?
            .or_not_exist(op, "Task not found", || {
                format!("The requested task with id {task_id} does not exist")
            })
    }
}

fn task_ref(course_id: CourseId, task_id: &TaskId) -> ResourceRef {
    ResourceRef::Task {
        course_id,
        task_id: task_id.clone(),
    }
}
