//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、ビジネスロジックはユースケース層に委譲
//! - エラーは `Result<_, ApiError>` で返し、レスポンスへの変換は [`crate::error`] に任せる

pub mod course;
pub mod health;
pub mod task;
pub mod user;

use courseworker_domain::{
    course::CourseId,
    error::{Kind, Problem},
    task::TaskId,
};
pub use course::{CourseState, create_course, delete_course, get_course, list_courses, update_course};
pub use health::health_check;
pub use task::{
    TaskState,
    create_task,
    delete_task,
    get_task,
    list_all_tasks,
    list_course_tasks,
    toggle_task_highlight,
    update_task,
};
pub use user::{UserState, confirm_account, get_user, list_users, login, register};

/// パスパラメータの講座 ID を解釈する
pub(crate) fn parse_course_id(op: &'static str, raw: &str) -> Result<CourseId, Problem> {
    raw.parse().map_err(|e| path_problem(op, "failed parsing course id", e))
}

/// パスパラメータのタスク ID を解釈する
pub(crate) fn parse_task_id(op: &'static str, raw: &str) -> Result<TaskId, Problem> {
    raw.parse().map_err(|e| path_problem(op, "failed parsing task id", e))
}

fn path_problem(
    op: &'static str,
    detail: &str,
    cause: impl std::error::Error + Send + Sync + 'static,
) -> Problem {
    Problem::builder()
        .op(op)
        .kind(Kind::InvalidRequest)
        .title("Invalid request")
        .detail(detail)
        .cause(cause)
        .build()
}
