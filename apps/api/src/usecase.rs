//! # ユースケース層
//!
//! 講座・タスク・ユーザーのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリ・キャッシュ・外部サービスを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは入力の解釈とレスポンス組み立てだけを行い、
//!   ロジックはユースケースに集約
//! - **エラーは `Problem`**: 全操作が op ラベル付きの `Problem` を返し、
//!   HTTP ステータスへの変換はハンドラ層のエラー翻訳に任せる
//!
//! ## モジュール構成
//!
//! - `ownership`: 所有者の解決と認可判定（キャッシュ + 正本へのフォールバック）
//! - `course`: 講座の CRUD
//! - `task`: タスクの CRUD とハイライト切り替え
//! - `user`: ユーザー一覧・登録・アカウント確認・ログイン

pub(crate) mod helpers;

pub mod course;
pub mod ownership;
pub mod task;
pub mod user;

pub use course::{CourseUseCaseImpl, CreateCourseInput, UpdateCourseInput};
pub use ownership::OwnershipGuard;
pub use task::{CreateTaskInput, TaskUseCaseImpl, UpdateTaskInput};
pub use user::{LoginInput, RegisterInput, UserUseCaseImpl};
