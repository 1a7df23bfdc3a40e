//! # 講座ユースケース
//!
//! 講座の一覧・取得・作成・更新・削除を実装する。
//!
//! 単一の講座を対象とする操作は、必ず [`OwnershipGuard`] で所有者を確認してから
//! リポジトリに触れる。一覧はクエリで所有者を絞り込むためガードを通さない。

use std::sync::Arc;

use courseworker_domain::{
    clock::Clock,
    course::{Course, CourseId, CourseName, NewCourse},
    error::Problem,
    ownership::ResourceRef,
    user::UserId,
};
use courseworker_infra::repository::{CourseRepository, TaskRepository};

use super::{
    helpers::{AffectedResultExt, InfraResultExt, OptionExt, invalid_input, rewrap},
    ownership::OwnershipGuard,
};

/// 講座作成の入力
#[derive(Debug, Clone)]
pub struct CreateCourseInput {
    pub name:    String,
    pub subname: Option<String>,
}

/// 講座更新の入力
#[derive(Debug, Clone)]
pub struct UpdateCourseInput {
    pub name:    String,
    pub subname: Option<String>,
}

/// 講座ユースケース実装
pub struct CourseUseCaseImpl {
    courses: Arc<dyn CourseRepository>,
    tasks:   Arc<dyn TaskRepository>,
    guard:   Arc<OwnershipGuard>,
    clock:   Arc<dyn Clock>,
}

impl CourseUseCaseImpl {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        tasks: Arc<dyn TaskRepository>,
        guard: Arc<OwnershipGuard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            courses,
            tasks,
            guard,
            clock,
        }
    }

    /// 呼び出し元が所有する講座の一覧を取得する
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn list_courses(&self, user_id: &UserId) -> Result<Vec<Course>, Problem> {
        self.courses
            .find_all_by_user(user_id)
            .await
            .or_database("serv/GetCourses", "Failed to get courses")
    }

    /// 講座を取得する
    #[tracing::instrument(skip_all, fields(%user_id, %course_id))]
    pub async fn get_course(&self, user_id: &UserId, course_id: CourseId) -> Result<Course, Problem> {
        const OP: &str = "serv/GetCourseByID";
        const TITLE: &str = "Failed to get course";

        self.guard
            .assert_ownership(user_id, &ResourceRef::Course(course_id))
            .await
            .map_err(rewrap(OP, TITLE))?;

        self.find_course(OP, course_id).await
    }

    /// 講座を作成し、所有者をキャッシュに書き込む
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn create_course(
        &self,
        user_id: &UserId,
        input: CreateCourseInput,
    ) -> Result<Course, Problem> {
        const OP: &str = "serv/CreateCourse";

        let name = CourseName::new(input.name).map_err(invalid_input(OP))?;
        let course = self
            .courses
            .insert(NewCourse {
                name,
                subname: normalize(input.subname),
                user_id: user_id.clone(),
                created_at: self.clock.now(),
            })
            .await
            .or_database(OP, "Failed to create course")?;

        self.guard
            .remember(&ResourceRef::Course(course.id()), user_id)
            .await;

        tracing::info!(course_id = %course.id(), "講座を作成しました");
        Ok(course)
    }

    /// 講座の名前とサブ名を更新する
    #[tracing::instrument(skip_all, fields(%user_id, %course_id))]
    pub async fn update_course(
        &self,
        user_id: &UserId,
        course_id: CourseId,
        input: UpdateCourseInput,
    ) -> Result<Course, Problem> {
        const OP: &str = "serv/UpdateCourse";
        const TITLE: &str = "Failed to update course";

        self.guard
            .assert_ownership(user_id, &ResourceRef::Course(course_id))
            .await
            .map_err(rewrap(OP, TITLE))?;

        let name = CourseName::new(input.name).map_err(invalid_input(OP))?;

        let course = self
            .find_course(OP, course_id)
            .await?
            .renamed(name, normalize(input.subname), self.clock.now());

        self.courses.update(&course).await.or_no_row(OP, TITLE)?;
        Ok(course)
    }

    /// 講座を削除し、講座と所属タスクの所有者をキャッシュから取り除く
    #[tracing::instrument(skip_all, fields(%user_id, %course_id))]
    pub async fn delete_course(&self, user_id: &UserId, course_id: CourseId) -> Result<(), Problem> {
        const OP: &str = "serv/DeleteCourse";
        const TITLE: &str = "Failed to delete course";

        let resource = ResourceRef::Course(course_id);
        self.guard
            .assert_ownership(user_id, &resource)
            .await
            .map_err(rewrap(OP, TITLE))?;

        // タスクは講座と一緒に削除されるため、削除前に ID を控えておく
        let tasks = self
            .tasks
            .find_all_by_course(course_id)
            .await
            .or_database(OP, TITLE)?;

        self.courses.delete(course_id).await.or_no_row(OP, TITLE)?;

        self.guard.forget(&resource).await;
        for task in &tasks {
            self.guard
                .forget(&ResourceRef::Task {
                    course_id,
                    task_id: task.id().clone(),
                })
                .await;
        }

        tracing::info!(removed_tasks = tasks.len(), "講座を削除しました");
        Ok(())
    }

    async fn find_course(&self, op: &'static str, course_id: CourseId) -> Result<Course, Problem> {
        self.courses
            .find_by_id(course_id)
            .await
            .or_database(op, "Failed to get course")?
            .or_not_exist(op, "Course not found", || {
                format!("The requested course with id {course_id} does not exist")
            })
    }
}

/// 空白だけのサブ名は未指定として扱う
fn normalize(subname: Option<String>) -> Option<String> {
    subname
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
