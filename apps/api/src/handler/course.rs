//! # 講座ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /courses` - 自分の講座一覧
//! - `POST /courses` - 講座作成
//! - `GET /courses/{course_id}` - 講座詳細
//! - `PUT /courses/{course_id}` - 講座更新
//! - `DELETE /courses/{course_id}` - 講座削除（所属タスクも削除される）
//!
//! いずれも認証必須。呼び出し元は [`AuthUser`] から取得する。

use std::sync::Arc;

use axum::{
    Extension,
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use courseworker_domain::course::Course;
use courseworker_shared::ApiResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::parse_course_id;
use crate::{
    error::ApiError,
    extract::ValidatedJson,
    middleware::AuthUser,
    usecase::{CourseUseCaseImpl, CreateCourseInput, UpdateCourseInput},
};

/// 講座 API の共有状態
pub struct CourseState {
    pub usecase: CourseUseCaseImpl,
}

// --- リクエスト/レスポンス型 ---

/// 講座作成・更新リクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name:    String,
    pub subname: Option<String>,
}

/// 講座 DTO
#[derive(Debug, Serialize)]
pub struct CourseDto {
    pub id:         i64,
    pub name:       String,
    pub subname:    Option<String>,
    pub user_id:    Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id:         course.id().as_i64(),
            name:       course.name().to_string(),
            subname:    course.subname().map(str::to_string),
            user_id:    *course.user_id().as_uuid(),
            created_at: course.created_at().to_rfc3339(),
            updated_at: course.updated_at().to_rfc3339(),
        }
    }
}

// --- ハンドラ ---

/// GET /courses
pub async fn list_courses(
    State(state): State<Arc<CourseState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let courses = state.usecase.list_courses(&auth.user_id).await?;

    let items: Vec<CourseDto> = courses.into_iter().map(CourseDto::from).collect();
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new("Courses successfully retrieved", items)),
    ))
}

/// GET /courses/{course_id}
pub async fn get_course(
    State(state): State<Arc<CourseState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = parse_course_id("hand/GetCourseByID", &course_id)?;

    let course = state.usecase.get_course(&auth.user_id, course_id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(
            "Course successfully retrieved",
            CourseDto::from(course),
        )),
    ))
}

/// POST /courses
///
/// ## レスポンス
///
/// - `201 Created`: 作成された講座（ID はデータベースが採番）
/// - `422 Unprocessable Entity`: 講座名が空
pub async fn create_course(
    State(state): State<Arc<CourseState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<CourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateCourseInput {
        name:    req.name,
        subname: req.subname,
    };

    let course = state.usecase.create_course(&auth.user_id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Course successfully created",
            CourseDto::from(course),
        )),
    ))
}

/// PUT /courses/{course_id}
pub async fn update_course(
    State(state): State<Arc<CourseState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
    ValidatedJson(req): ValidatedJson<CourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = parse_course_id("hand/UpdateCourse", &course_id)?;
    let input = UpdateCourseInput {
        name:    req.name,
        subname: req.subname,
    };

    let course = state
        .usecase
        .update_course(&auth.user_id, course_id, input)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(
            "Course successfully updated",
            CourseDto::from(course),
        )),
    ))
}

/// DELETE /courses/{course_id}
pub async fn delete_course(
    State(state): State<Arc<CourseState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = parse_course_id("hand/DeleteCourse", &course_id)?;

    state.usecase.delete_course(&auth.user_id, course_id).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message_only("Course successfully deleted")),
    ))
}
