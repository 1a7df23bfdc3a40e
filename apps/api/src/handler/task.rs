//! # タスクハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /tasks` - 自分の全講座のタスク一覧
//! - `GET /courses/{course_id}/tasks` - 講座のタスク一覧
//! - `POST /courses/{course_id}/tasks` - タスク作成
//! - `GET /courses/{course_id}/tasks/{task_id}` - タスク詳細
//! - `PUT /courses/{course_id}/tasks/{task_id}` - タスク更新
//! - `PATCH /courses/{course_id}/tasks/{task_id}/highlight` - ハイライト切り替え
//! - `DELETE /courses/{course_id}/tasks/{task_id}` - タスク削除
//!
//! 締め切りは `YYYY-MM-DD HH:MM` 形式の文字列で受け付け、RFC 3339 で返す。

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use courseworker_domain::task::Task;
use courseworker_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{parse_course_id, parse_task_id};
use crate::{
    error::ApiError,
    extract::ValidatedJson,
    middleware::AuthUser,
    usecase::{CreateTaskInput, TaskUseCaseImpl, UpdateTaskInput},
};

/// タスク API の共有状態
pub struct TaskState {
    pub usecase: TaskUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// タスク作成リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title:       String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50))]
    pub task_type:   String,
    pub description: Option<String>,
    pub deadline:    Option<String>,
}

/// タスク更新リクエスト（省略したフィールドは変更しない）
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title:       Option<String>,
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 50))]
    pub task_type:   Option<String>,
    pub description: Option<String>,
    pub deadline:    Option<String>,
    pub is_done:     Option<bool>,
}

/// タスク DTO
#[derive(Debug, Serialize)]
pub struct TaskDto {
    pub id:          Uuid,
    pub course_id:   i64,
    pub is_done:     bool,
    pub highlight:   bool,
    pub title:       String,
    pub description: Option<String>,
    pub image:       Option<String>,
    #[serde(rename = "type")]
    pub task_type:   String,
    pub deadline:    Option<String>,
    pub created_at:  String,
    pub updated_at:  String,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id:          *task.id().as_uuid(),
            course_id:   task.course_id().as_i64(),
            is_done:     task.is_done(),
            highlight:   task.highlight(),
            title:       task.title().to_string(),
            description: task.description().map(str::to_string),
            image:       task.image().map(str::to_string),
            task_type:   task.task_type().to_string(),
            deadline:    task.deadline().map(|d| d.to_rfc3339()),
            created_at:  task.created_at().to_rfc3339(),
            updated_at:  task.updated_at().to_rfc3339(),
        }
    }
}

fn task_list(tasks: Vec<Task>) -> Json<ApiResponse<Vec<TaskDto>>> {
    let items = tasks.into_iter().map(TaskDto::from).collect::<Vec<_>>();
    Json(ApiResponse::new("Tasks successfully retrieved", items))
}

// --- ハンドラ ---

/// GET /tasks
pub async fn list_all_tasks(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.usecase.list_all_tasks(&auth.user_id).await?;

    Ok((StatusCode::OK, task_list(tasks)))
}

/// GET /courses/{course_id}/tasks
pub async fn list_course_tasks(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = parse_course_id("hand/GetTasksByCourseID", &course_id)?;

    let tasks = state
        .usecase
        .list_course_tasks(&auth.user_id, course_id)
        .await?;

    Ok((StatusCode::OK, task_list(tasks)))
}

/// POST /courses/{course_id}/tasks
///
/// ## レスポンス
///
/// - `201 Created`: 作成されたタスク
/// - `400 Bad Request`: 締め切りの形式が不正
/// - `403 Forbidden`: 他人の講座
/// - `404 Not Found`: 講座が存在しない
pub async fn create_task(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = parse_course_id("hand/CreateTask", &course_id)?;
    let input = CreateTaskInput {
        title:       req.title,
        task_type:   req.task_type,
        description: req.description,
        deadline:    req.deadline,
    };

    let task = state
        .usecase
        .create_task(&auth.user_id, course_id, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Task successfully created", TaskDto::from(task))),
    ))
}

/// GET /courses/{course_id}/tasks/{task_id}
pub async fn get_task(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    const OP: &str = "hand/GetTaskByID";
    let course_id = parse_course_id(OP, &course_id)?;
    let task_id = parse_task_id(OP, &task_id)?;

    let task = state
        .usecase
        .get_task(&auth.user_id, course_id, &task_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("Task successfully retrieved", TaskDto::from(task))),
    ))
}

/// PUT /courses/{course_id}/tasks/{task_id}
pub async fn update_task(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, task_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    const OP: &str = "hand/UpdateTask";
    let course_id = parse_course_id(OP, &course_id)?;
    let task_id = parse_task_id(OP, &task_id)?;
    let input = UpdateTaskInput {
        title:       req.title,
        task_type:   req.task_type,
        description: req.description,
        deadline:    req.deadline,
        is_done:     req.is_done,
    };

    let task = state
        .usecase
        .update_task(&auth.user_id, course_id, &task_id, input)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("Task successfully updated", TaskDto::from(task))),
    ))
}

/// PATCH /courses/{course_id}/tasks/{task_id}/highlight
pub async fn toggle_task_highlight(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    const OP: &str = "hand/UpdateHighlightTask";
    let course_id = parse_course_id(OP, &course_id)?;
    let task_id = parse_task_id(OP, &task_id)?;

    let task = state
        .usecase
        .toggle_highlight(&auth.user_id, course_id, &task_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("Task successfully updated", TaskDto::from(task))),
    ))
}

/// DELETE /courses/{course_id}/tasks/{task_id}
pub async fn delete_task(
    State(state): State<Arc<TaskState>>,
    Extension(auth): Extension<AuthUser>,
    Path((course_id, task_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    const OP: &str = "hand/DeleteTask";
    let course_id = parse_course_id(OP, &course_id)?;
    let task_id = parse_task_id(OP, &task_id)?;

    state
        .usecase
        .delete_task(&auth.user_id, course_id, &task_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message_only("Task successfully deleted")),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use courseworker_domain::user::UserId;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use crate::test_utils::TestApp;

    async fn create_task(app: &TestApp, user: &UserId, course_id: i64) -> String {
        let (status, body) = app
            .send(
                Method::POST,
                &format!("/courses/{course_id}/tasks"),
                Some(user),
                Some(json!({
                    "title": "Homework 1",
                    "type": "assignment",
                    "deadline": "2026-03-01 23:59"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_タスクを作成して取得できる() {
        // Given
        let app = TestApp::new();
        let user = UserId::new();
        let course_id = app.create_course(&user, "Algorithms").await;

        // When
        let task_id = create_task(&app, &user, course_id).await;
        let (status, body) = app
            .send(
                Method::GET,
                &format!("/courses/{course_id}/tasks/{task_id}"),
                Some(&user),
                None,
            )
            .await;

        // Then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task successfully retrieved");
        assert_eq!(body["data"]["type"], "assignment");
        assert_eq!(body["data"]["deadline"], "2026-03-01T23:59:00+00:00");
        assert_eq!(body["data"]["highlight"], false);
    }

    #[tokio::test]
    async fn test_締め切りの形式が不正なら400() {
        let app = TestApp::new();
        let user = UserId::new();
        let course_id = app.create_course(&user, "Algorithms").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/courses/{course_id}/tasks"),
                Some(&user),
                Some(json!({ "title": "Homework", "type": "assignment", "deadline": "tomorrow" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "invalid_request");
        assert_eq!(body["error"]["param"][0]["name"], "deadline");
    }

    #[tokio::test]
    async fn test_他人の講座へのタスク作成は403() {
        let app = TestApp::new();
        let course_id = app.create_course(&UserId::new(), "Algorithms").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/courses/{course_id}/tasks"),
                Some(&UserId::new()),
                Some(json!({ "title": "Homework", "type": "assignment" })),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Failed to create task");
        assert_eq!(app.db.task_count(), 0);
    }

    #[tokio::test]
    async fn test_他人の講座へは締め切りが不正でも403() {
        let app = TestApp::new();
        let course_id = app.create_course(&UserId::new(), "Algorithms").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/courses/{course_id}/tasks"),
                Some(&UserId::new()),
                Some(json!({ "title": "Homework", "type": "assignment", "deadline": "tomorrow" })),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["kind"], "forbidden");
    }

    #[tokio::test]
    async fn test_不正なタスクidは400() {
        let app = TestApp::new();
        let user = UserId::new();
        let course_id = app.create_course(&user, "Algorithms").await;

        let (status, body) = app
            .send(
                Method::GET,
                &format!("/courses/{course_id}/tasks/not-a-uuid"),
                Some(&user),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["detail"], "failed parsing task id");
    }

    #[tokio::test]
    async fn test_ハイライトの切り替えと更新() {
        // Given
        let app = TestApp::new();
        let user = UserId::new();
        let course_id = app.create_course(&user, "Algorithms").await;
        let task_id = create_task(&app, &user, course_id).await;
        let path = format!("/courses/{course_id}/tasks/{task_id}");

        // When
        let (highlight_status, highlighted) = app
            .send(Method::PATCH, &format!("{path}/highlight"), Some(&user), None)
            .await;
        let (update_status, updated) = app
            .send(Method::PUT, &path, Some(&user), Some(json!({ "is_done": true })))
            .await;

        // Then
        assert_eq!(highlight_status, StatusCode::OK);
        assert_eq!(highlighted["data"]["highlight"], true);
        assert_eq!(update_status, StatusCode::OK);
        assert_eq!(updated["message"], "Task successfully updated");
        assert_eq!(updated["data"]["is_done"], true);
        assert_eq!(updated["data"]["highlight"], true);
        assert_eq!(updated["data"]["title"], "Homework 1");
    }

    #[tokio::test]
    async fn test_一覧は全講座と講座別で取得できる() {
        let app = TestApp::new();
        let user = UserId::new();
        let first = app.create_course(&user, "Algorithms").await;
        let second = app.create_course(&user, "Compilers").await;
        create_task(&app, &user, first).await;
        create_task(&app, &user, second).await;

        let (_, all) = app.send(Method::GET, "/tasks", Some(&user), None).await;
        let (_, by_course) = app
            .send(Method::GET, &format!("/courses/{first}/tasks"), Some(&user), None)
            .await;

        let len = |v: &Value| v["data"].as_array().unwrap().len();
        assert_eq!(all["message"], "Tasks successfully retrieved");
        assert_eq!(len(&all), 2);
        assert_eq!(len(&by_course), 1);
    }

    #[tokio::test]
    async fn test_タスクを削除すると以降は404() {
        let app = TestApp::new();
        let user = UserId::new();
        let course_id = app.create_course(&user, "Algorithms").await;
        let task_id = create_task(&app, &user, course_id).await;
        let path = format!("/courses/{course_id}/tasks/{task_id}");

        let (status, body) = app.send(Method::DELETE, &path, Some(&user), None).await;
        let (again, _) = app.send(Method::DELETE, &path, Some(&user), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task successfully deleted");
        assert_eq!(again, StatusCode::NOT_FOUND);
        assert_eq!(app.cache.entry(&format!("task:{task_id}")), None);
    }
}
