//! # タスク
//!
//! 講座に属する課題。タスクの所有者は講座の所有者と同じ。
//!
//! ## 締め切りの入力形式
//!
//! 締め切りは `YYYY-MM-DD HH:MM`（UTC）の文字列で受け付ける。
//! 形式が合わない場合は `Kind::InvalidRequest` の Problem を返す。

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{
    course::CourseId,
    error::{Kind, Problem},
};

/// 締め切りの入力形式（chrono の書式）
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

define_uuid_id! {
    /// タスク ID
    pub struct TaskId;
}

define_validated_string! {
    /// タスクのタイトル
    pub struct TaskTitle {
        field: "title",
        max_length: 255,
    }
}

define_validated_string! {
    /// タスクの種別（例: "assignment", "quiz"）
    pub struct TaskType {
        field: "type",
        max_length: 50,
    }
}

/// 締め切り文字列をパースする
pub fn parse_deadline(value: &str) -> Result<DateTime<Utc>, Problem> {
    NaiveDateTime::parse_from_str(value.trim(), DEADLINE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            Problem::builder()
                .kind(Kind::InvalidRequest)
                .title("Invalid deadline")
                .detail("deadline must be formatted as 'YYYY-MM-DD HH:MM'")
                .param("deadline", "must match format 'YYYY-MM-DD HH:MM'")
                .cause(e)
                .build()
        })
}

/// タスク更新内容
///
/// `None` のフィールドは変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title:       Option<TaskTitle>,
    pub task_type:   Option<TaskType>,
    pub description: Option<String>,
    pub deadline:    Option<DateTime<Utc>>,
    pub is_done:     Option<bool>,
}

/// タスクエンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id:          TaskId,
    course_id:   CourseId,
    is_done:     bool,
    highlight:   bool,
    title:       TaskTitle,
    description: Option<String>,
    image:       Option<String>,
    task_type:   TaskType,
    deadline:    Option<DateTime<Utc>>,
    created_at:  DateTime<Utc>,
    updated_at:  DateTime<Utc>,
}

impl Task {
    /// 新しいタスクを作成する（未完了・ハイライトなし）
    pub fn new(
        course_id: CourseId,
        title: TaskTitle,
        task_type: TaskType,
        description: Option<String>,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            course_id,
            is_done: false,
            highlight: false,
            title,
            description,
            image: None,
            task_type,
            deadline,
            created_at: now,
            updated_at: now,
        }
    }

    /// データベースの行から復元する
    #[allow(clippy::too_many_arguments)]
    pub fn from_db(
        id: TaskId,
        course_id: CourseId,
        is_done: bool,
        highlight: bool,
        title: TaskTitle,
        description: Option<String>,
        image: Option<String>,
        task_type: TaskType,
        deadline: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            course_id,
            is_done,
            highlight,
            title,
            description,
            image,
            task_type,
            deadline,
            created_at,
            updated_at,
        }
    }

    /// 変更内容を適用した新しい状態を返す
    pub fn apply(self, changes: TaskChanges, now: DateTime<Utc>) -> Self {
        Self {
            title: changes.title.unwrap_or(self.title),
            task_type: changes.task_type.unwrap_or(self.task_type),
            description: changes.description.or(self.description),
            deadline: changes.deadline.or(self.deadline),
            is_done: changes.is_done.unwrap_or(self.is_done),
            updated_at: now,
            ..self
        }
    }

    /// ハイライトを反転した新しい状態を返す
    pub fn toggle_highlight(self, now: DateTime<Utc>) -> Self {
        Self {
            highlight: !self.highlight,
            updated_at: now,
            ..self
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn highlight(&self) -> bool {
        self.highlight
    }

    pub fn title(&self) -> &TaskTitle {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn task_type(&self) -> &TaskType {
        &self.task_type
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn sample_task() -> Task {
        Task::new(
            CourseId::new(1),
            TaskTitle::new("Read chapter 1").unwrap(),
            TaskType::new("reading").unwrap(),
            None,
            None,
            fixed_now(),
        )
    }

    #[test]
    fn test_締め切りをパースできる() {
        let deadline = parse_deadline("2026-03-01 23:59").unwrap();

        assert_eq!(deadline, Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap());
    }

    #[rstest]
    #[case("2026-03-01")]
    #[case("2026/03/01 23:59")]
    #[case("2026-13-01 10:00")]
    #[case("")]
    fn test_形式の違う締め切りはinvalid_request(#[case] input: &str) {
        let problem = parse_deadline(input).unwrap_err();

        assert_eq!(problem.kind(), Kind::InvalidRequest);
        assert_eq!(problem.params()[0].name, "deadline");
    }

    #[test]
    fn test_新しいタスクは未完了でハイライトなし() {
        let task = sample_task();

        assert!(!task.is_done());
        assert!(!task.highlight());
        assert_eq!(task.created_at(), task.updated_at());
    }

    #[test]
    fn test_toggle_highlightは二回で元に戻る() {
        let later = fixed_now() + chrono::Duration::minutes(5);

        let once = sample_task().toggle_highlight(later);
        let twice = once.clone().toggle_highlight(later);

        assert!(once.highlight());
        assert!(!twice.highlight());
        assert_eq!(once.updated_at(), later);
    }

    #[test]
    fn test_applyは指定したフィールドだけを変更する() {
        let task = sample_task();
        let id = task.id().clone();
        let later = fixed_now() + chrono::Duration::hours(2);

        let updated = task.apply(
            TaskChanges {
                is_done: Some(true),
                description: Some("pages 1-20".to_string()),
                ..TaskChanges::default()
            },
            later,
        );

        assert_eq!(updated.id(), &id);
        assert!(updated.is_done());
        assert_eq!(updated.description(), Some("pages 1-20"));
        assert_eq!(updated.title().as_str(), "Read chapter 1");
        assert_eq!(updated.updated_at(), later);
    }
}
