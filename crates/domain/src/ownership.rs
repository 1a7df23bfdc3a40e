//! # 所有関係
//!
//! 認可判定の対象となるリソースを表す。
//! 講座・タスクはそれぞれちょうど一人のユーザーに属し、所有者は作成後に変わらない。

use crate::{course::CourseId, task::TaskId};

/// 所有者を解決する対象のリソース
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    /// 講座
    Course(CourseId),
    /// タスク（所属する講座と組で指定する）
    Task { course_id: CourseId, task_id: TaskId },
}

impl ResourceRef {
    /// キャッシュキー（`course:{id}` / `task:{id}`）
    pub fn cache_key(&self) -> String {
        match self {
            Self::Course(id) => format!("course:{id}"),
            Self::Task { task_id, .. } => format!("task:{task_id}"),
        }
    }

    /// リソース種別の表示名
    pub fn label(&self) -> &'static str {
        match self {
            Self::Course(_) => "course",
            Self::Task { .. } => "task",
        }
    }

    /// リソース自身の ID の文字列表現
    pub fn id_string(&self) -> String {
        match self {
            Self::Course(id) => id.to_string(),
            Self::Task { task_id, .. } => task_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_講座のキャッシュキー() {
        let resource = ResourceRef::Course(CourseId::new(42));

        assert_eq!(resource.cache_key(), "course:42");
        assert_eq!(resource.label(), "course");
        assert_eq!(resource.id_string(), "42");
    }

    #[test]
    fn test_タスクのキャッシュキーはタスクidだけで決まる() {
        let task_id = TaskId::new();
        let a = ResourceRef::Task {
            course_id: CourseId::new(1),
            task_id:   task_id.clone(),
        };
        let b = ResourceRef::Task {
            course_id: CourseId::new(2),
            task_id:   task_id.clone(),
        };

        assert_eq!(a.cache_key(), format!("task:{task_id}"));
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
