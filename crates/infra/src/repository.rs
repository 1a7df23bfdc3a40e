//! # リポジトリ実装
//!
//! 永続化操作のトレイトと PostgreSQL 実装を提供する。
//!
//! ## 設計方針
//!
//! - **トレイト経由で注入**: ユースケース層は `Arc<dyn XRepository>` に依存し、
//!   テストではインメモリ実装（[`crate::mock`]）に差し替える
//! - **実行時クエリ**: `sqlx::query_as` と `FromRow` で行をマッピングする

pub mod course_repository;
pub mod ownership_repository;
pub mod task_repository;
pub mod user_repository;

pub use course_repository::{CourseRepository, PostgresCourseRepository};
pub use ownership_repository::{OwnershipRepository, PostgresOwnershipRepository};
pub use task_repository::{PostgresTaskRepository, TaskRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
